use serde::de::MapAccess;

use crate::{
    decode::{
        first, first_lenient, list_of, Flag, LenientInt, LenientStr, MissingField, Record,
        RecordSeed,
    },
    domain::{FileId, FileUniqueId},
    types::file::{FileIds, PhotoSize},
};

/// Sticker type; independent of the format (`is_animated` / `is_video`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StickerType {
    #[default]
    Regular,
    Mask,
    CustomEmoji,
}

impl StickerType {
    /// Unrecognized names fall back to `Regular`.
    pub fn from_wire(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "mask" => StickerType::Mask,
            "custom_emoji" => StickerType::CustomEmoji,
            _ => StickerType::Regular,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StickerType::Regular => "regular",
            StickerType::Mask => "mask",
            StickerType::CustomEmoji => "custom_emoji",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sticker {
    pub file_id: FileId,
    pub file_unique_id: FileUniqueId,
    pub kind: StickerType,
    pub width: u32,
    pub height: u32,
    pub is_animated: bool,
    pub is_video: bool,
    pub thumbnail: Option<PhotoSize>,
    pub emoji: Option<String>,
    pub set_name: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Default)]
pub struct StickerBuilder {
    ids: FileIds,
    kind: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    is_animated: Option<bool>,
    is_video: Option<bool>,
    thumbnail: Option<PhotoSize>,
    emoji: Option<String>,
    set_name: Option<String>,
    file_size: Option<u64>,
}

impl Record for Sticker {
    const NAME: &'static str = "Sticker";
    type Builder = StickerBuilder;

    fn accept<'de, A>(
        b: &mut StickerBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "type" => first_lenient(&mut b.kind, map, LenientStr)?,
            "width" => first_lenient(&mut b.width, map, LenientInt::new())?,
            "height" => first_lenient(&mut b.height, map, LenientInt::new())?,
            "is_animated" => first_lenient(&mut b.is_animated, map, Flag)?,
            "is_video" => first_lenient(&mut b.is_video, map, Flag)?,
            "thumbnail" => first(&mut b.thumbnail, map, RecordSeed::new())?,
            "emoji" => first_lenient(&mut b.emoji, map, LenientStr)?,
            "set_name" => first_lenient(&mut b.set_name, map, LenientStr)?,
            "file_size" => first_lenient(&mut b.file_size, map, LenientInt::new())?,
            _ => return b.ids.accept(key, map),
        }
        Ok(true)
    }

    fn finish(b: StickerBuilder) -> std::result::Result<Self, MissingField> {
        let (file_id, file_unique_id) = b.ids.finish()?;
        Ok(Sticker {
            file_id,
            file_unique_id,
            kind: b
                .kind
                .as_deref()
                .map(StickerType::from_wire)
                .unwrap_or_default(),
            width: b.width.unwrap_or(0),
            height: b.height.unwrap_or(0),
            is_animated: b.is_animated.unwrap_or(false),
            is_video: b.is_video.unwrap_or(false),
            thumbnail: b.thumbnail,
            emoji: b.emoji,
            set_name: b.set_name,
            file_size: b.file_size,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StickerSet {
    pub name: String,
    pub title: String,
    pub sticker_type: StickerType,
    pub is_animated: bool,
    pub is_video: bool,
    pub stickers: Vec<Sticker>,
    pub thumbnail: Option<PhotoSize>,
}

#[derive(Default)]
pub struct StickerSetBuilder {
    name: Option<String>,
    title: Option<String>,
    sticker_type: Option<String>,
    is_animated: Option<bool>,
    is_video: Option<bool>,
    stickers: Option<Vec<Sticker>>,
    thumbnail: Option<PhotoSize>,
}

impl Record for StickerSet {
    const NAME: &'static str = "StickerSet";
    type Builder = StickerSetBuilder;

    fn accept<'de, A>(
        b: &mut StickerSetBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "name" => first_lenient(&mut b.name, map, LenientStr)?,
            "title" => first_lenient(&mut b.title, map, LenientStr)?,
            "sticker_type" => first_lenient(&mut b.sticker_type, map, LenientStr)?,
            "is_animated" => first_lenient(&mut b.is_animated, map, Flag)?,
            "is_video" => first_lenient(&mut b.is_video, map, Flag)?,
            "stickers" => first(&mut b.stickers, map, list_of::<Sticker>())?,
            "thumbnail" => first(&mut b.thumbnail, map, RecordSeed::new())?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(b: StickerSetBuilder) -> std::result::Result<Self, MissingField> {
        Ok(StickerSet {
            name: b.name.unwrap_or_default(),
            title: b.title.unwrap_or_default(),
            sticker_type: b
                .sticker_type
                .as_deref()
                .map(StickerType::from_wire)
                .unwrap_or_default(),
            is_animated: b.is_animated.unwrap_or(false),
            is_video: b.is_video.unwrap_or(false),
            stickers: b.stickers.unwrap_or_default(),
            thumbnail: b.thumbnail,
        })
    }
}

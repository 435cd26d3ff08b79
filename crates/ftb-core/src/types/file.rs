use serde::de::MapAccess;

use crate::{
    decode::{
        first, first_lenient, required, LenientInt, LenientStr, MissingField, Record, RecordSeed,
        Str,
    },
    domain::{FileId, FileUniqueId},
};

/// A file ready to be downloaded via `file_path`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct File {
    pub file_id: FileId,
    pub file_unique_id: FileUniqueId,
    pub file_size: Option<u64>,
    pub file_path: Option<String>,
}

/// A general file (as opposed to photos, voice messages and audio files).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub file_id: FileId,
    pub file_unique_id: FileUniqueId,
    pub thumbnail: Option<PhotoSize>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

/// One size of a photo or a file/sticker thumbnail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoSize {
    pub file_id: FileId,
    pub file_unique_id: FileUniqueId,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u64>,
}

/// Both identifiers every file-like record carries.
#[derive(Default)]
pub(crate) struct FileIds {
    file_id: Option<String>,
    file_unique_id: Option<String>,
}

impl FileIds {
    pub(crate) fn accept<'de, A>(
        &mut self,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "file_id" => first(&mut self.file_id, map, Str)?,
            "file_unique_id" => first(&mut self.file_unique_id, map, Str)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(crate) fn finish(self) -> std::result::Result<(FileId, FileUniqueId), MissingField> {
        Ok((
            FileId(required(self.file_id, "file_id")?),
            FileUniqueId(required(self.file_unique_id, "file_unique_id")?),
        ))
    }
}

#[derive(Default)]
pub struct FileBuilder {
    ids: FileIds,
    file_size: Option<u64>,
    file_path: Option<String>,
}

impl Record for File {
    const NAME: &'static str = "File";
    type Builder = FileBuilder;

    fn accept<'de, A>(
        b: &mut FileBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "file_size" => first_lenient(&mut b.file_size, map, LenientInt::new())?,
            "file_path" => first_lenient(&mut b.file_path, map, LenientStr)?,
            _ => return b.ids.accept(key, map),
        }
        Ok(true)
    }

    fn finish(b: FileBuilder) -> std::result::Result<Self, MissingField> {
        let (file_id, file_unique_id) = b.ids.finish()?;
        Ok(File {
            file_id,
            file_unique_id,
            file_size: b.file_size,
            file_path: b.file_path,
        })
    }
}

#[derive(Default)]
pub struct DocumentBuilder {
    ids: FileIds,
    thumbnail: Option<PhotoSize>,
    file_name: Option<String>,
    mime_type: Option<String>,
    file_size: Option<u64>,
}

impl Record for Document {
    const NAME: &'static str = "Document";
    type Builder = DocumentBuilder;

    fn accept<'de, A>(
        b: &mut DocumentBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "thumbnail" => first(&mut b.thumbnail, map, RecordSeed::new())?,
            "file_name" => first_lenient(&mut b.file_name, map, LenientStr)?,
            "mime_type" => first_lenient(&mut b.mime_type, map, LenientStr)?,
            "file_size" => first_lenient(&mut b.file_size, map, LenientInt::new())?,
            _ => return b.ids.accept(key, map),
        }
        Ok(true)
    }

    fn finish(b: DocumentBuilder) -> std::result::Result<Self, MissingField> {
        let (file_id, file_unique_id) = b.ids.finish()?;
        Ok(Document {
            file_id,
            file_unique_id,
            thumbnail: b.thumbnail,
            file_name: b.file_name,
            mime_type: b.mime_type,
            file_size: b.file_size,
        })
    }
}

#[derive(Default)]
pub struct PhotoSizeBuilder {
    ids: FileIds,
    width: Option<u32>,
    height: Option<u32>,
    file_size: Option<u64>,
}

impl Record for PhotoSize {
    const NAME: &'static str = "PhotoSize";
    type Builder = PhotoSizeBuilder;

    fn accept<'de, A>(
        b: &mut PhotoSizeBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "width" => first_lenient(&mut b.width, map, LenientInt::new())?,
            "height" => first_lenient(&mut b.height, map, LenientInt::new())?,
            "file_size" => first_lenient(&mut b.file_size, map, LenientInt::new())?,
            _ => return b.ids.accept(key, map),
        }
        Ok(true)
    }

    fn finish(b: PhotoSizeBuilder) -> std::result::Result<Self, MissingField> {
        let (file_id, file_unique_id) = b.ids.finish()?;
        Ok(PhotoSize {
            file_id,
            file_unique_id,
            width: b.width.unwrap_or(0),
            height: b.height.unwrap_or(0),
            file_size: b.file_size,
        })
    }
}

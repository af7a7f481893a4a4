use serde_json::Value;
use std::{
    fs,
    io::{Cursor, Write},
};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::params::{ImageParams, ImagePayload};

use super::errors::ApiClientError;
use super::payload::{basename, MANIFEST_FILE_NAME};

/// Zips the manifest and every file backed image into an in-memory archive.
///
/// Images are stored under their basename, which image validation has
/// already checked to be unique. Inline images live in the manifest only.
///
/// # Errors
///
/// Fails if an image file cannot be read or has no usable file name.
pub fn build_zip(manifest: &Value, images: &[ImageParams]) -> Result<Vec<u8>, ApiClientError> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file(MANIFEST_FILE_NAME, options)?;
    zip.write_all(&serde_json::to_vec(manifest)?)?;

    for image in images {
        if let Some(ImagePayload::File(path)) = image.payload() {
            let name = basename(path)?;
            log::debug!("Adding {} to bundle as {name}", path.display());
            zip.start_file(name, options)?;
            zip.write_all(&fs::read(path)?)?;
        }
    }

    let bytes = zip.finish()?.into_inner();
    log::debug!("Bundle is {} bytes", bytes.len());
    Ok(bytes)
}

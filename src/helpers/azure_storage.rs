use std::sync::Arc;

use bytes::Bytes;
use log::debug;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::helpers::sas_url::SasUrl;

use object_store::azure::MicrosoftAzureBuilder;
use object_store::path::Path;
use object_store::{Error, MultipartId, ObjectStore, PutMode, Result};

const STORE: &str = "DataLake";

pub fn get_azure_store(sas_url: &SasUrl) -> Result<Arc<dyn ObjectStore>> {
    let azure_store = MicrosoftAzureBuilder::new()
        .with_account(&sas_url.account_name)
        .with_container_name(&sas_url.container_name)
        .with_sas_authorization(sas_url.sas.clone())
        .build()?;

    Ok(Arc::new(azure_store))
}

/// Directory and file operations on top of a flat object store.
#[derive(Clone)]
pub struct DataLake {
    store: Arc<dyn ObjectStore>,
}

#[derive(Debug, Clone)]
pub struct DirectoryHandle {
    path: Path,
}

#[derive(Debug, Clone)]
pub struct FileHandle {
    path: Path,
}

impl FileHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct WriteStream {
    store: Arc<dyn ObjectStore>,
    path: Path,
    multipart_id: MultipartId,
    writer: Box<dyn AsyncWrite + Unpin + Send>,
    written: usize,
}

impl DataLake {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        DataLake { store }
    }

    /// Directories are implicit in the object namespace, so this only
    /// validates the path and hands back a handle for it.
    pub fn ensure_directory(&self, directory: &str) -> Result<DirectoryHandle> {
        let path = Path::parse(directory)?;
        debug!("--- Directory ready: {}", path);
        Ok(DirectoryHandle { path })
    }

    /// Creates an empty file, failing with `AlreadyExists` if the name is taken.
    pub async fn create_file(&self, directory: &DirectoryHandle, name: &str) -> Result<FileHandle> {
        let path = directory.path.child(name);
        self.store
            .put_opts(&path, Bytes::new(), PutMode::Create.into())
            .await?;
        debug!("--- Created file: {}", path);
        Ok(FileHandle { path })
    }

    /// Without `overwrite` the file must still be empty.
    pub async fn open_for_write(&self, file: &FileHandle, overwrite: bool) -> Result<WriteStream> {
        if !overwrite {
            let meta = self.store.head(&file.path).await?;
            if meta.size > 0 {
                return Err(Error::AlreadyExists {
                    path: file.path.to_string(),
                    source: format!("file already holds {} bytes", meta.size).into(),
                });
            }
        }

        let (multipart_id, writer) = self.store.put_multipart(&file.path).await?;
        Ok(WriteStream {
            store: self.store.clone(),
            path: file.path.clone(),
            multipart_id,
            writer,
            written: 0,
        })
    }
}

impl WriteStream {
    pub async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if let Err(e) = self.writer.write_all(bytes).await {
            abort(&self.store, &self.path, &self.multipart_id).await;
            return Err(io_error(e));
        }
        self.written += bytes.len();
        Ok(())
    }

    /// Commits the upload and returns the number of bytes written.
    pub async fn close(mut self) -> Result<usize> {
        if let Err(e) = self.writer.shutdown().await {
            abort(&self.store, &self.path, &self.multipart_id).await;
            return Err(io_error(e));
        }
        Ok(self.written)
    }
}

async fn abort(store: &Arc<dyn ObjectStore>, path: &Path, multipart_id: &MultipartId) {
    if let Err(e) = store.abort_multipart(path, multipart_id).await {
        debug!("--- Could not abort upload of {}: {}", path, e);
    }
}

fn io_error(e: std::io::Error) -> Error {
    Error::Generic {
        store: STORE,
        source: Box::new(e),
    }
}

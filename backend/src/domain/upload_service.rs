//! Upload service implementing the [`UploadService`] driving port.
//!
//! Blobs live in a [`FileStore`] under generated names; metadata lives in a
//! [`FileRepository`]. Avatar uploads update the owner's `avatar_url` and
//! licence uploads update the driver profile.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ports::{
    FileDownload, FileRepository, FileStore, ProfileRepository, UploadRequest, UploadService,
    UserRepository,
};
use crate::domain::service_support::{
    invalid_field, load_account, map_file_repository_error, map_file_store_error,
    map_profile_repository_error, map_user_repository_error,
};
use crate::domain::{
    Error, StoredFile, UploadPolicy, UploadPurpose, UploadValidationError, UserId,
    sanitize_file_name,
};

fn map_validation(err: UploadValidationError) -> Error {
    let code = match err {
        UploadValidationError::Empty => "empty",
        UploadValidationError::TooLarge { .. } => "too_large",
        UploadValidationError::UnsupportedContentType(_) => "unsupported_type",
        UploadValidationError::UnknownPurpose(_) => "unknown_purpose",
    };
    invalid_field("file", code, err.to_string())
}

/// Validated file storage tied to user accounts.
#[derive(Clone)]
pub struct UploadServiceImpl {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    files: Arc<dyn FileRepository>,
    store: Arc<dyn FileStore>,
    policy: UploadPolicy,
    clock: Arc<dyn Clock>,
}

/// Driven ports the upload service writes to.
pub struct UploadPorts {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub files: Arc<dyn FileRepository>,
    pub store: Arc<dyn FileStore>,
}

impl UploadServiceImpl {
    pub fn new(ports: UploadPorts, policy: UploadPolicy, clock: Arc<dyn Clock>) -> Self {
        let UploadPorts {
            users,
            profiles,
            files,
            store,
        } = ports;
        Self {
            users,
            profiles,
            files,
            store,
            policy,
            clock,
        }
    }

    async fn link_to_owner(&self, file: &StoredFile) -> Result<(), Error> {
        match file.purpose {
            UploadPurpose::Avatar => {
                let mut account = load_account(self.users.as_ref(), &file.owner_id).await?;
                account.user.avatar_url = Some(file.url());
                self.users
                    .update(&account)
                    .await
                    .map_err(map_user_repository_error)
            }
            UploadPurpose::License => {
                let mut profile = self
                    .profiles
                    .find_driver(&file.owner_id)
                    .await
                    .map_err(map_profile_repository_error)?
                    .ok_or_else(|| {
                        Error::conflict("create a driver profile before uploading a licence")
                    })?;
                profile.license_document = Some(file.url());
                self.profiles
                    .save_driver(&profile)
                    .await
                    .map_err(map_profile_repository_error)
            }
            UploadPurpose::Vehicle => Ok(()),
        }
    }

    async fn unlink_avatar(&self, file: &StoredFile) -> Result<(), Error> {
        let mut account = load_account(self.users.as_ref(), &file.owner_id).await?;
        if account.user.avatar_url.as_deref() != Some(file.url().as_str()) {
            return Ok(());
        }
        account.user.avatar_url = None;
        self.users
            .update(&account)
            .await
            .map_err(map_user_repository_error)
    }

    async fn unlink_license(&self, file: &StoredFile) -> Result<(), Error> {
        let Some(mut profile) = self
            .profiles
            .find_driver(&file.owner_id)
            .await
            .map_err(map_profile_repository_error)?
        else {
            return Ok(());
        };
        if profile.license_document.as_deref() != Some(file.url().as_str()) {
            return Ok(());
        }
        profile.license_document = None;
        self.profiles
            .save_driver(&profile)
            .await
            .map_err(map_profile_repository_error)
    }

    async fn find_file(&self, file_id: &Uuid) -> Result<StoredFile, Error> {
        self.files
            .find_by_id(file_id)
            .await
            .map_err(map_file_repository_error)?
            .ok_or_else(|| Error::not_found(format!("file {file_id} not found")))
    }

    async fn discard_blob(&self, name: &str) {
        if let Err(err) = self.store.delete(name).await {
            warn!(stored_name = name, error = %err, "failed to remove orphaned upload");
        }
    }
}

#[async_trait]
impl UploadService for UploadServiceImpl {
    async fn store(&self, owner: &UserId, request: UploadRequest) -> Result<StoredFile, Error> {
        let UploadRequest {
            purpose,
            file_name,
            content_type,
            bytes,
        } = request;
        let extension = self
            .policy
            .extension_for(&content_type)
            .map_err(map_validation)?;
        let size_bytes = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        self.policy.check_size(size_bytes).map_err(map_validation)?;

        let id = Uuid::new_v4();
        let file = StoredFile {
            id,
            owner_id: owner.clone(),
            purpose,
            original_name: sanitize_file_name(&file_name),
            stored_name: format!("{id}.{extension}"),
            content_type: content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase(),
            size_bytes,
            created_at: self.clock.utc(),
        };

        self.store
            .put(&file.stored_name, bytes)
            .await
            .map_err(map_file_store_error)?;
        if let Err(err) = self.files.create(&file).await {
            self.discard_blob(&file.stored_name).await;
            return Err(map_file_repository_error(err));
        }
        if let Err(err) = self.link_to_owner(&file).await {
            self.discard_blob(&file.stored_name).await;
            if let Err(cleanup) = self.files.delete(&file.id).await {
                warn!(file_id = %file.id, error = %cleanup, "failed to remove orphaned metadata");
            }
            return Err(err);
        }
        info!(
            file_id = %file.id,
            purpose = purpose.as_str(),
            size_bytes,
            "stored upload"
        );
        Ok(file)
    }

    async fn fetch(&self, requester: &UserId, file_id: &Uuid) -> Result<FileDownload, Error> {
        let file = self.find_file(file_id).await?;
        if &file.owner_id != requester && file.purpose != UploadPurpose::Avatar {
            return Err(Error::forbidden("file belongs to another user"));
        }
        let bytes = self
            .store
            .get(&file.stored_name)
            .await
            .map_err(map_file_store_error)?;
        Ok(FileDownload { file, bytes })
    }

    async fn delete(&self, owner: &UserId, file_id: &Uuid) -> Result<(), Error> {
        let file = self.find_file(file_id).await?;
        if &file.owner_id != owner {
            return Err(Error::forbidden("file belongs to another user"));
        }
        match file.purpose {
            UploadPurpose::Avatar => self.unlink_avatar(&file).await?,
            UploadPurpose::License => self.unlink_license(&file).await?,
            UploadPurpose::Vehicle => {}
        }
        self.files
            .delete(file_id)
            .await
            .map_err(map_file_repository_error)?;
        self.store
            .delete(&file.stored_name)
            .await
            .map_err(map_file_store_error)?;
        info!(file_id = %file_id, "deleted upload");
        Ok(())
    }
}

#[cfg(test)]
#[path = "upload_service_tests.rs"]
mod tests;

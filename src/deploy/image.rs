// ABOUTME: Provides the target image by building a local context or pulling a reference.
// ABOUTME: Either way the result is tagged with the target name.

use super::archive::archive_context;
use super::error::DeployError;
use super::progress::{self, ProgressSummary};
use crate::diagnostics::Diagnostics;
use crate::runtime::{ImageError, ImageOps};
use crate::types::{ImageId, ImageRef, TargetName};
use std::path::{Path, PathBuf};

/// File whose presence marks a directory as a build context.
pub const BUILD_RECIPE: &str = "Dockerfile";

/// Where the target image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Local directory containing a `Dockerfile`.
    BuildContext(PathBuf),
    /// Registry reference to pull.
    Registry(ImageRef),
}

impl ImageSource {
    /// A directory with a `Dockerfile` is built; anything else must parse as
    /// a registry reference. Touches only the local filesystem, never the
    /// engine.
    pub async fn resolve(image: &str) -> Result<Self, ImageError> {
        let path = Path::new(image);
        if is_file(&path.join(BUILD_RECIPE)).await {
            return Ok(ImageSource::BuildContext(path.to_path_buf()));
        }
        if is_dir(path).await || image.starts_with('.') || image.starts_with('/') {
            return Err(ImageError::NotFound(format!(
                "no {BUILD_RECIPE} in build context {image}"
            )));
        }

        ImageRef::parse(image)
            .map(ImageSource::Registry)
            .map_err(|e| {
                ImageError::NotFound(format!(
                    "{image:?} is neither a directory with a {BUILD_RECIPE} nor an image reference ({e})"
                ))
            })
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_dir())
}

/// Outcome of the image stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidedImage {
    pub source: ImageSource,
    /// Id reported by a build, when the engine sent one.
    pub id: Option<ImageId>,
    pub progress: ProgressSummary,
}

/// Build or pull the resolved image and tag it as `name`.
///
/// # Errors
///
/// `ImageBuild`/`Archive` for the build path, `ImagePull` for the pull path.
pub async fn provide_image<R: ImageOps>(
    runtime: &R,
    source: &ImageSource,
    name: &TargetName,
    diagnostics: &mut Diagnostics,
) -> Result<ProvidedImage, DeployError> {
    let progress = match source {
        ImageSource::BuildContext(dir) => {
            tracing::info!(context = %dir.display(), tag = %name, "building image");
            let context = archive_context(dir)
                .await
                .map_err(|source| DeployError::Archive {
                    path: dir.clone(),
                    source,
                })?;
            tracing::debug!(bytes = context.len(), "build context archived");

            let stream = runtime
                .build_image(context, name)
                .await
                .map_err(DeployError::ImageBuild)?;
            progress::drain(stream, diagnostics)
                .await
                .map_err(DeployError::ImageBuild)?
        }
        ImageSource::Registry(reference) => {
            tracing::info!(image = %reference, tag = %name, "pulling image");
            let stream = runtime
                .pull_image(reference)
                .await
                .map_err(DeployError::ImagePull)?;
            let summary = progress::drain(stream, diagnostics)
                .await
                .map_err(DeployError::ImagePull)?;

            runtime
                .tag_image(reference, name)
                .await
                .map_err(DeployError::ImagePull)?;
            summary
        }
    };

    if progress.errors > 0 {
        tracing::warn!(
            errors = progress.errors,
            "image stream reported errors but completed"
        );
    }
    tracing::info!(tag = %name, "image ready");

    Ok(ProvidedImage {
        source: source.clone(),
        id: progress.image.clone(),
        progress,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn directory_with_recipe_is_built() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(BUILD_RECIPE), "FROM scratch\n").unwrap();
        let image = dir.path().to_str().unwrap();

        assert_eq!(
            ImageSource::resolve(image).await.unwrap(),
            ImageSource::BuildContext(dir.path().to_path_buf())
        );
    }

    #[tokio::test]
    async fn directory_without_recipe_is_not_built() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().to_str().unwrap();

        assert!(matches!(
            ImageSource::resolve(image).await,
            Err(ImageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reference_is_pulled() {
        let source = ImageSource::resolve("ghcr.io/org/app:v1").await.unwrap();
        assert!(matches!(
            source,
            ImageSource::Registry(ref r) if r.to_string() == "ghcr.io/org/app:v1"
        ));
    }

    #[tokio::test]
    async fn nonexistent_relative_path_is_not_pulled() {
        assert!(matches!(
            ImageSource::resolve("./dokcer").await,
            Err(ImageError::NotFound(_))
        ));
    }
}

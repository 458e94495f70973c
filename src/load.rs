//! Reading and decoding of ONNX model files.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use onnx_diff_proto::onnx::ModelProto;
use onnx_diff_proto::protobuf::{DecodeMessage, ProtobufError};
use tracing::debug;

/// Errors that occur when loading a model.
#[derive(Debug)]
pub struct LoadError {
    inner: LoadErrorImpl,
    path: Option<PathBuf>,
}

impl LoadError {
    fn new(kind: LoadErrorImpl) -> Self {
        Self {
            inner: kind,
            path: None,
        }
    }

    fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    /// The path of the file that this error relates to.
    ///
    /// This is `None` if the model was decoded from a buffer.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Return the category of error.
    pub fn kind(&self) -> LoadErrorKind {
        self.inner.kind()
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = self.path.as_deref() {
            write!(f, "failed to load \"{}\": {}", path.display(), self.inner)
        } else {
            self.inner.fmt(f)
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

impl From<LoadErrorImpl> for LoadError {
    fn from(val: LoadErrorImpl) -> Self {
        Self::new(val)
    }
}

/// Categories of error when loading a model.
///
/// See [`LoadError::kind`].
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum LoadErrorKind {
    /// An I/O error occurred reading the model file.
    IoError,

    /// The model data could not be decoded.
    ParseError,

    /// The data decoded successfully but does not look like an ONNX model.
    UnknownFileType,
}

#[derive(Debug)]
enum LoadErrorImpl {
    ReadFailed(std::io::Error),
    ParseFailed(ProtobufError),
    UnknownFileType,
}

impl LoadErrorImpl {
    fn kind(&self) -> LoadErrorKind {
        type Kind = LoadErrorKind;

        match self {
            Self::ReadFailed(_) => Kind::IoError,
            Self::ParseFailed(_) => Kind::ParseError,
            Self::UnknownFileType => Kind::UnknownFileType,
        }
    }

    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadFailed(err) => Some(err),
            Self::ParseFailed(err) => Some(err),
            Self::UnknownFileType => None,
        }
    }
}

impl Display for LoadErrorImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed(e) => write!(f, "read error: {e}"),
            Self::ParseFailed(e) => write!(f, "parse error: {e}"),
            Self::UnknownFileType => write!(f, "not an ONNX model (missing IR version)"),
        }
    }
}

/// Decode an ONNX model from a buffer.
///
/// Every ONNX model declares an IR version. Data which decodes successfully
/// but has no IR version, such as an empty buffer, is rejected with
/// [`LoadErrorKind::UnknownFileType`]. A model with no graph is accepted.
pub fn decode_model(buf: &[u8]) -> Result<ModelProto, LoadError> {
    let model = ModelProto::decode(buf).map_err(LoadErrorImpl::ParseFailed)?;
    if model.ir_version.is_none() {
        return Err(LoadErrorImpl::UnknownFileType.into());
    }
    Ok(model)
}

/// Read and decode an ONNX model file.
pub fn load_model_file<P: AsRef<Path>>(path: P) -> Result<ModelProto, LoadError> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .map_err(|err| LoadError::new(LoadErrorImpl::ReadFailed(err)).with_path(path))?;
    debug!(path = %path.display(), size = data.len(), "read model file");
    decode_model(&data).map_err(|err| err.with_path(path))
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use onnx_diff_testing::ModelBuilder;

    use super::{LoadErrorKind, decode_model, load_model_file};

    #[test]
    fn test_decode_model() {
        let buf = ModelBuilder::new().producer("pytorch", "2.1.0").encode();
        let model = decode_model(&buf).unwrap();
        assert_eq!(model.producer_name.as_deref(), Some("pytorch"));
        assert!(model.graph.is_some());
    }

    #[test]
    fn test_decode_model_without_graph() {
        let buf = ModelBuilder::new().without_graph().encode();
        let model = decode_model(&buf).unwrap();
        assert!(model.graph.is_none());
    }

    #[test]
    fn test_decode_invalid_model() {
        let err = decode_model(&[0x08]).err().unwrap();
        assert_eq!(err.kind(), LoadErrorKind::ParseError);
        assert!(err.source().is_some());
        assert!(err.path().is_none());

        let err = decode_model(&[]).err().unwrap();
        assert_eq!(err.kind(), LoadErrorKind::UnknownFileType);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_model_file("does-not-exist.onnx").err().unwrap();
        assert_eq!(err.kind(), LoadErrorKind::IoError);
        assert_eq!(
            err.path().and_then(|p| p.to_str()),
            Some("does-not-exist.onnx")
        );
        assert!(err.to_string().starts_with("failed to load \"does-not-exist.onnx\""));
    }
}

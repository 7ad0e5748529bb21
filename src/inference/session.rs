//! ONNX Runtime session construction and device selection.

use crate::config::InferenceDevice;
use ort::session::Session;
use ort::session::builder::SessionBuilder;
use std::path::Path;

/// Build an ONNX Runtime session for `model_path` on the requested device.
///
/// The device choice is fixed at load time and never re-evaluated per call.
/// GPU registration is best effort: `Auto` falls back to CPU silently,
/// `Gpu` falls back with a warning.
pub fn build_session(model_path: &Path, device: InferenceDevice) -> Result<Session, ort::Error> {
    let builder = Session::builder()?;

    let builder = match device {
        InferenceDevice::Cpu => {
            tracing::info!("Requested device: CPU");
            builder
        }
        InferenceDevice::Auto | InferenceDevice::Gpu => register_gpu(builder, device)?,
    };

    builder.commit_from_file(model_path)
}

#[cfg(feature = "cuda")]
fn register_gpu(
    builder: SessionBuilder,
    device: InferenceDevice,
) -> Result<SessionBuilder, ort::Error> {
    use ort::execution_providers::CUDAExecutionProvider;

    if device == InferenceDevice::Gpu {
        tracing::info!("Requested device: CUDA");
    } else {
        tracing::info!("Auto mode: CUDA available, attempting GPU");
    }
    builder.with_execution_providers([CUDAExecutionProvider::default().build()])
}

#[cfg(not(feature = "cuda"))]
fn register_gpu(
    builder: SessionBuilder,
    device: InferenceDevice,
) -> Result<SessionBuilder, ort::Error> {
    if device == InferenceDevice::Gpu {
        tracing::warn!("GPU requested but this build has no GPU provider, using CPU");
    } else {
        tracing::info!("Auto mode: no GPU providers available, using CPU");
    }
    Ok(builder)
}

//! Inference device selection

use crate::error::{Result, ResumeWriterError};
use candle_core::Device;

/// Get the best available device for inference (GPU if available, CPU fallback)
pub fn get_best_device() -> Result<Device> {
    // Try CUDA first (NVIDIA GPUs on Linux/Windows)
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            println!("🚀 Using CUDA GPU for acceleration");
            return Ok(device);
        }
    }

    // Try Metal (Apple GPUs on macOS) - some operations may fall back to CPU
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                println!("🚀 Using Metal GPU for acceleration");
                return Ok(device);
            }
            Err(e) => {
                println!("⚠️  Metal GPU initialization failed: {}", e);
            }
        }
    }

    println!("ℹ️  Running on CPU");
    Ok(Device::Cpu)
}

/// Get device with optional user override from the RESUME_WRITER_DEVICE
/// environment variable (cuda, metal, or cpu).
pub fn get_device_with_override() -> Result<Device> {
    if let Ok(device_preference) = std::env::var("RESUME_WRITER_DEVICE") {
        match device_preference.to_lowercase().as_str() {
            "cuda" => {
                #[cfg(feature = "cuda")]
                {
                    return Device::new_cuda(0).map_err(|e| {
                        ResumeWriterError::ModelError(format!("Failed to initialize CUDA: {}", e))
                    });
                }
                #[cfg(not(feature = "cuda"))]
                {
                    return Err(ResumeWriterError::ModelError(
                        "CUDA support not compiled in".to_string(),
                    ));
                }
            }
            "metal" => {
                #[cfg(feature = "metal")]
                {
                    return Device::new_metal(0).map_err(|e| {
                        ResumeWriterError::ModelError(format!("Failed to initialize Metal: {}", e))
                    });
                }
                #[cfg(not(feature = "metal"))]
                {
                    return Err(ResumeWriterError::ModelError(
                        "Metal support not compiled in".to_string(),
                    ));
                }
            }
            "cpu" => {
                return Ok(Device::Cpu);
            }
            _ => {
                println!(
                    "⚠️  Unknown device '{}', falling back to auto-detection",
                    device_preference
                );
            }
        }
    }

    get_best_device()
}

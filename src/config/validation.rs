use super::ConfigError;

pub(super) fn validate_model_path(model_path: &str) -> Result<(), ConfigError> {
    if model_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "model path must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(super) fn validate_sample_rate(sample_rate: f32) -> Result<(), ConfigError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "sample rate must be a positive number, got {sample_rate}"
        )));
    }
    Ok(())
}

pub(super) fn validate_worker_threads(worker_threads: usize) -> Result<(), ConfigError> {
    if worker_threads == 0 {
        return Err(ConfigError::Validation(
            "worker thread count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

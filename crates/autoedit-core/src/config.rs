//! Configuration module
//!
//! Server and pipeline settings, loaded from the environment (and an optional `.env`
//! file) with typed defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

// Common constants
const HOST: &str = "127.0.0.1";
const PORT: u16 = 5000;
const MAX_UPLOAD_SIZE_MB: usize = 100;
const ALLOWED_EXTENSIONS: &str = "mp4,mov,avi,mkv";
const UPLOAD_DIR: &str = "uploads";
const PROCESSED_DIR: &str = "processed";
const FFMPEG_PATH: &str = "ffmpeg";
const VIDEO_FILTER: &str = "eq=contrast=1.1:brightness=0.02:saturation=1.15,deshake";
const AUDIO_FILTER: &str = "loudnorm=I=-16:TP=-1.5:LRA=11";
const VIDEO_CODEC: &str = "libx264";
const ENCODE_PRESET: &str = "medium";
const OUTPUT_PREFIX: &str = "processed_";
const OUTPUT_EXTENSION: &str = "mp4";
const DOWNLOAD_PREFIX: &str = "edited_";
const MAX_CONCURRENT_JOBS: usize = 2;
const JOB_QUEUE_SIZE: usize = 100;

/// Server settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub host: String,
    pub server_port: u16,
    pub environment: String,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            host: HOST.to_string(),
            server_port: PORT,
            environment: "development".to_string(),
        }
    }
}

/// Upload pipeline configuration
#[derive(Clone, Debug)]
pub struct ProcessorConfig {
    pub base: BaseConfig,
    pub max_upload_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub upload_dir: PathBuf,
    pub processed_dir: PathBuf,
    // External tool invocation
    pub ffmpeg_path: String,
    pub video_filter: String,
    pub audio_filter: String,
    pub video_codec: String,
    pub encode_preset: String,
    // Artifact naming
    pub output_prefix: String,
    pub output_extension: String,
    pub download_prefix: String,
    // Worker pool
    pub max_concurrent_jobs: usize,
    pub job_queue_size: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            allowed_extensions: parse_list(ALLOWED_EXTENSIONS),
            upload_dir: PathBuf::from(UPLOAD_DIR),
            processed_dir: PathBuf::from(PROCESSED_DIR),
            ffmpeg_path: FFMPEG_PATH.to_string(),
            video_filter: VIDEO_FILTER.to_string(),
            audio_filter: AUDIO_FILTER.to_string(),
            video_codec: VIDEO_CODEC.to_string(),
            encode_preset: ENCODE_PRESET.to_string(),
            output_prefix: OUTPUT_PREFIX.to_string(),
            output_extension: OUTPUT_EXTENSION.to_string(),
            download_prefix: DOWNLOAD_PREFIX.to_string(),
            max_concurrent_jobs: MAX_CONCURRENT_JOBS,
            job_queue_size: JOB_QUEUE_SIZE,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ProcessorConfig>);

impl Config {
    fn as_processor(&self) -> &ProcessorConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_processor().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ProcessorConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_processor().validate()
    }

    pub fn host(&self) -> &str {
        &self.as_processor().base.host
    }

    pub fn server_port(&self) -> u16 {
        self.as_processor().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_processor().base.environment
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_processor().max_upload_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.as_processor().allowed_extensions
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.as_processor().upload_dir
    }

    pub fn processed_dir(&self) -> &PathBuf {
        &self.as_processor().processed_dir
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_processor().ffmpeg_path
    }

    pub fn video_filter(&self) -> &str {
        &self.as_processor().video_filter
    }

    pub fn audio_filter(&self) -> &str {
        &self.as_processor().audio_filter
    }

    pub fn video_codec(&self) -> &str {
        &self.as_processor().video_codec
    }

    pub fn encode_preset(&self) -> &str {
        &self.as_processor().encode_preset
    }

    pub fn output_prefix(&self) -> &str {
        &self.as_processor().output_prefix
    }

    pub fn output_extension(&self) -> &str {
        &self.as_processor().output_extension
    }

    pub fn download_prefix(&self) -> &str {
        &self.as_processor().download_prefix
    }

    pub fn max_concurrent_jobs(&self) -> usize {
        self.as_processor().max_concurrent_jobs
    }

    pub fn job_queue_size(&self) -> usize {
        self.as_processor().job_queue_size
    }
}

impl From<ProcessorConfig> for Config {
    fn from(config: ProcessorConfig) -> Self {
        Config(Box::new(config))
    }
}

/// Read `key` and parse it, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn megabytes_to_bytes(megabytes: usize) -> Result<usize, anyhow::Error> {
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large: {}", megabytes))
}

/// Split a comma-separated list, lowercasing and dropping leading dots (".MP4" -> "mp4").
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ProcessorConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            host: env_string("HOST", HOST),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
        };

        let max_upload_size_mb: usize = env_or("MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB);
        let max_upload_size_bytes = megabytes_to_bytes(max_upload_size_mb)?;

        let config = ProcessorConfig {
            base,
            max_upload_size_bytes,
            allowed_extensions: parse_list(&env_string("ALLOWED_EXTENSIONS", ALLOWED_EXTENSIONS)),
            upload_dir: PathBuf::from(env_string("UPLOAD_DIR", UPLOAD_DIR)),
            processed_dir: PathBuf::from(env_string("PROCESSED_DIR", PROCESSED_DIR)),
            ffmpeg_path: env_string("FFMPEG_PATH", FFMPEG_PATH),
            video_filter: env_string("VIDEO_FILTER", VIDEO_FILTER),
            audio_filter: env_string("AUDIO_FILTER", AUDIO_FILTER),
            video_codec: env_string("VIDEO_CODEC", VIDEO_CODEC),
            encode_preset: env_string("ENCODE_PRESET", ENCODE_PRESET),
            output_prefix: env_string("OUTPUT_PREFIX", OUTPUT_PREFIX),
            output_extension: env_string("OUTPUT_EXTENSION", OUTPUT_EXTENSION)
                .trim_start_matches('.')
                .to_lowercase(),
            download_prefix: env_string("DOWNLOAD_PREFIX", DOWNLOAD_PREFIX),
            max_concurrent_jobs: env_or("MAX_CONCURRENT_JOBS", MAX_CONCURRENT_JOBS),
            job_queue_size: env_or("JOB_QUEUE_SIZE", JOB_QUEUE_SIZE),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_EXTENSIONS must list at least one extension"
            ));
        }

        if self.upload_dir == self.processed_dir {
            return Err(anyhow::anyhow!(
                "UPLOAD_DIR and PROCESSED_DIR must be different directories"
            ));
        }

        if self.video_filter.trim().is_empty() || self.audio_filter.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "VIDEO_FILTER and AUDIO_FILTER must not be empty"
            ));
        }

        if self.output_prefix.is_empty() || self.output_prefix.contains(['/', '\\']) {
            return Err(anyhow::anyhow!(
                "OUTPUT_PREFIX must be a non-empty file name prefix"
            ));
        }

        if self.output_extension.is_empty()
            || !self.output_extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(anyhow::anyhow!(
                "OUTPUT_EXTENSION must be a plain alphanumeric extension"
            ));
        }

        if self.max_concurrent_jobs == 0 || self.job_queue_size == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_JOBS and JOB_QUEUE_SIZE must be greater than 0"
            ));
        }

        Ok(())
    }
}

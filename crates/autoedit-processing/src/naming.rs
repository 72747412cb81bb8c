//! File name sanitization and artifact naming.
//!
//! Every name that reaches the disk goes through [`sanitize_filename`]: directory
//! components are dropped, anything outside `[A-Za-z0-9._-]` becomes `_`, dot runs
//! collapse, and leading/trailing dots and underscores are stripped.

use uuid::Uuid;

/// Longest file name most filesystems accept, in bytes
const MAX_FILENAME_LENGTH: usize = 255;
const FALLBACK_STEM: &str = "video";
/// Marks an output the media tool is still writing
const STAGING_PREFIX: &str = ".";

/// Derive a safe single-segment file name from a client-supplied name.
///
/// Returns `None` when nothing usable is left (e.g. `".."`, `"///"`).
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let mut sanitized = String::with_capacity(base.len());
    for c in base.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if c == '.' && sanitized.ends_with('.') {
            continue;
        }
        sanitized.push(c);
    }

    let trimmed = sanitized.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.len() <= MAX_FILENAME_LENGTH {
        return Some(trimmed.to_string());
    }

    // Too long: shorten the stem and keep the extension.
    let capped = match split_extension(trimmed) {
        (stem, Some(ext)) if ext.len() + 1 < MAX_FILENAME_LENGTH => format!(
            "{}.{}",
            truncate_stem(stem, MAX_FILENAME_LENGTH - ext.len() - 1),
            ext
        ),
        _ => truncate_stem(trimmed, MAX_FILENAME_LENGTH).to_string(),
    };
    Some(capped)
}

/// Names for one job's input and output artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    /// `{job_id}_{sanitized}` in the incoming directory
    pub input_name: String,
    /// `{prefix}{job_id}_{stem}.{ext}` in the outgoing directory
    pub output_name: String,
    /// Hidden name the tool writes to before the output is published
    pub staging_name: String,
}

/// Naming rules for processed artifacts
#[derive(Debug, Clone)]
pub struct ArtifactNaming {
    output_prefix: String,
    output_extension: String,
    download_prefix: String,
}

impl ArtifactNaming {
    pub fn new(
        output_prefix: impl Into<String>,
        output_extension: impl Into<String>,
        download_prefix: impl Into<String>,
    ) -> Self {
        Self {
            output_prefix: output_prefix.into(),
            output_extension: output_extension.into().trim_start_matches('.').to_string(),
            download_prefix: download_prefix.into(),
        }
    }

    /// Build the input and output names for a sanitized upload name.
    ///
    /// The job id keeps concurrent uploads of the same file apart. The stem is
    /// shortened so that every derived name fits in [`MAX_FILENAME_LENGTH`] bytes.
    pub fn derive(&self, job_id: Uuid, sanitized: &str) -> ArtifactNames {
        let (stem, extension) = split_extension(sanitized);
        let job_id = job_id.to_string();

        let input_fixed = job_id.len() + 1 + extension.map_or(0, |ext| ext.len() + 1);
        let staging_fixed = STAGING_PREFIX.len()
            + self.output_prefix.len()
            + job_id.len()
            + 1
            + 1
            + self.output_extension.len();
        let budget = MAX_FILENAME_LENGTH.saturating_sub(input_fixed.max(staging_fixed));
        let stem = truncate_stem(stem, budget);

        let input_name = match extension {
            Some(ext) => format!("{}_{}.{}", job_id, stem, ext),
            None => format!("{}_{}", job_id, stem),
        };
        let output_name = format!(
            "{}{}_{}.{}",
            self.output_prefix, job_id, stem, self.output_extension
        );
        let staging_name = format!("{}{}", STAGING_PREFIX, output_name);

        ArtifactNames {
            input_name,
            output_name,
            staging_name,
        }
    }

    /// User-facing attachment name for a stored output, e.g.
    /// `processed_<uuid>_clip.mp4` -> `edited_clip.mp4`.
    pub fn download_name(&self, output_name: &str) -> String {
        let rest = output_name
            .strip_prefix(self.output_prefix.as_str())
            .unwrap_or(output_name);
        let rest = strip_job_id(rest);
        format!("{}{}", self.download_prefix, rest)
    }
}

/// `"a.b.mp4"` -> `("a.b", Some("mp4"))`, `"mp4"` -> `("mp4", None)`
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// Cut `stem` to at most `max_bytes` on a char boundary without leaving a
/// trailing dot or underscore.
fn truncate_stem(stem: &str, max_bytes: usize) -> &str {
    if stem.len() <= max_bytes {
        return stem;
    }
    let mut end = max_bytes;
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    let cut = stem[..end].trim_end_matches(['.', '_']);
    if cut.is_empty() {
        FALLBACK_STEM
    } else {
        cut
    }
}

fn strip_job_id(name: &str) -> &str {
    const UUID_LEN: usize = 36;
    if name.len() > UUID_LEN + 1 && name.as_bytes()[UUID_LEN] == b'_' {
        if let Some(candidate) = name.get(..UUID_LEN) {
            if Uuid::parse_str(candidate).is_ok() {
                return &name[UUID_LEN + 1..];
            }
        }
    }
    name
}

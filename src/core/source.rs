use std::path::Path;
use url::Url;

/// Turns a command-line argument or a picked file into something the engine
/// can open. URIs pass through; paths become `file://` URIs.
pub fn source_uri(input: &str) -> anyhow::Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow::anyhow!("Empty source"));
    }

    // Single-letter schemes are Windows drive letters, not URIs
    if let Ok(url) = Url::parse(trimmed) {
        if url.scheme().len() > 1 {
            return Ok(url.to_string());
        }
    }

    let path = Path::new(trimmed);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    Url::from_file_path(&absolute)
        .map(|url| url.to_string())
        .map_err(|_| anyhow::anyhow!("Cannot convert {} to a file URI", absolute.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_passes_through() {
        assert_eq!(source_uri("file:///tmp/movie.mp4").unwrap(), "file:///tmp/movie.mp4");
        assert_eq!(
            source_uri("  https://example.com/clip.webm ").unwrap(),
            "https://example.com/clip.webm"
        );
    }

    #[test]
    fn test_empty_source_is_rejected() {
        assert!(source_uri("   ").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_path_becomes_file_uri() {
        assert_eq!(
            source_uri("/videos/my movie.mp4").unwrap(),
            "file:///videos/my%20movie.mp4"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_path_is_resolved_against_cwd() {
        let uri = source_uri("movie.mp4").unwrap();
        assert!(uri.starts_with("file:///"));
        assert!(uri.ends_with("/movie.mp4"));
    }
}

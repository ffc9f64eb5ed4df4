use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::error::AppError;

/// Creates all directories in the given path, including parent directories if they don't exist.
#[inline]
pub async fn create_dirs(path: &Path) -> Result<(), AppError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(AppError::Io)?;
    Ok(())
}

/// Name of the output file when none is given: `all_<YYYYmmddHHMMSS>.ts`.
pub fn default_output_name<Tz: TimeZone>(now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    PathBuf::from(format!("all_{}.ts", now.format("%Y%m%d%H%M%S")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_default_output_name() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            default_output_name(&now),
            PathBuf::from("all_20240309070501.ts")
        );
    }

    #[tokio::test]
    async fn test_create_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        create_dirs(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}

// 캐시 설정
//
// CacheOptions는 불변 빌더: with_* 메서드는 수정된 복사본을 반환한다.

use crate::error::DbalResult;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cache lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheTime {
    seconds: u64,
}

impl CacheTime {
    pub const fn seconds(seconds: u64) -> Self {
        Self { seconds }
    }

    pub const fn minutes(minutes: u64) -> Self {
        Self::seconds(minutes * 60)
    }

    pub const fn hours(hours: u64) -> Self {
        Self::minutes(hours * 60)
    }

    pub const fn days(days: u64) -> Self {
        Self::hours(days * 24)
    }

    pub const fn hour() -> Self {
        Self::hours(1)
    }

    pub const fn day() -> Self {
        Self::days(1)
    }

    pub fn as_secs(&self) -> u64 {
        self.seconds
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}

impl Default for CacheTime {
    fn default() -> Self {
        Self::day()
    }
}

impl From<Duration> for CacheTime {
    fn from(duration: Duration) -> Self {
        Self::seconds(duration.as_secs())
    }
}

/// 환경 변수 이름
pub const ENV_DIRECTORY: &str = "DBAL_CACHE_DIR";
pub const ENV_DIRECTORIES: &str = "DBAL_CACHE_DIRECTORIES";
pub const ENV_LIMIT: &str = "DBAL_CACHE_LIMIT";
pub const ENV_SECONDS: &str = "DBAL_CACHE_SECONDS";

/// Where and for how long query results are cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Cache root
    directory: PathBuf,
    /// Shard depth: nested single-character directories taken from the key
    directories: usize,
    /// Maximum rows captured per entry, 0 = unlimited
    limit: usize,
    time: CacheTime,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            directory: env::temp_dir().join("sql-cache"),
            directories: 3,
            limit: 10_000,
            time: CacheTime::day(),
        }
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(&self, directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..self.clone()
        }
    }

    pub fn with_directories(&self, directories: usize) -> Self {
        Self {
            directories,
            ..self.clone()
        }
    }

    pub fn with_limit(&self, limit: usize) -> Self {
        Self {
            limit,
            ..self.clone()
        }
    }

    pub fn with_time(&self, time: CacheTime) -> Self {
        Self {
            time,
            ..self.clone()
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn directories(&self) -> usize {
        self.directories
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn time(&self) -> CacheTime {
        self.time
    }

    /// 환경 변수에서 로드 (unset or unparsable values keep the defaults)
    pub fn from_env() -> Self {
        Self::default().apply_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn apply_lookup<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = self;

        if let Some(dir) = lookup(ENV_DIRECTORY).filter(|d| !d.is_empty()) {
            options.directory = PathBuf::from(dir);
        }
        if let Some(depth) = parse_var(&lookup, ENV_DIRECTORIES) {
            options.directories = depth;
        }
        if let Some(limit) = parse_var(&lookup, ENV_LIMIT) {
            options.limit = limit;
        }
        if let Some(seconds) = parse_var(&lookup, ENV_SECONDS) {
            options.time = CacheTime::seconds(seconds);
        }

        options
    }

    /// 파일에서 로드
    pub fn load(path: impl AsRef<Path>) -> DbalResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// 파일에 저장
    pub fn save(&self, path: impl AsRef<Path>) -> DbalResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, json)?;
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparsable cache setting");
            None
        }
    }
}

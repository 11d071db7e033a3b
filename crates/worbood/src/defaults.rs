use camino::{Utf8Path, Utf8PathBuf};
use dirs::home_dir;

pub const DEFAULT_WORBOO_HOME: &str = ".worboo";

pub fn default_home_dir() -> Utf8PathBuf {
    home_dir()
        .as_deref()
        .and_then(Utf8Path::from_path)
        .map_or_else(
            || Utf8PathBuf::from(DEFAULT_WORBOO_HOME),
            |home| home.join(DEFAULT_WORBOO_HOME),
        )
}

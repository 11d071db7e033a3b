use camino::Utf8PathBuf;

#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct StoreConfig {
    pub path: Utf8PathBuf,
    /// Cursor used when no cache exists yet (the block before the
    /// configured starting block).
    pub initial_position: u64,
}

impl StoreConfig {
    #[must_use]
    pub const fn new(path: Utf8PathBuf) -> Self {
        Self {
            path,
            initial_position: 0,
        }
    }

    #[must_use]
    pub const fn with_initial_position(mut self, initial_position: u64) -> Self {
        self.initial_position = initial_position;
        self
    }
}

use super::Adapter;

/// Searches any index; everything else falls back to the trait defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyAdapter;

impl Adapter for ReadOnlyAdapter {
    fn name(&self) -> &'static str {
        "default"
    }
}

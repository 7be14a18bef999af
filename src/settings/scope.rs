/// Runs the wrapped action exactly once when the guard goes out of scope,
/// whether the scope is left by return, `?` or unwinding.
pub struct ScopeExit<F: FnOnce()> {
    action: Option<F>,
}

impl<F: FnOnce()> ScopeExit<F> {
    pub fn new(action: F) -> Self {
        Self {
            action: Some(action),
        }
    }
}

impl<F: FnOnce()> Drop for ScopeExit<F> {
    fn drop(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

use std::sync::Mutex;

static COUNTER: Mutex<u128> = Mutex::new(0);

/// Process-unique ids for AST nodes and callables. Node ids key the
/// resolver's side-table; callable ids give identity-based equality.
pub fn unique_u128() -> u128 {
    let mut guard = COUNTER.lock().unwrap();
    *guard += 1;
    *guard
}

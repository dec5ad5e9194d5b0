/// Split `[start, stop]` into consecutive windows of at most `batch_size` blocks.
/// A zero batch size is treated as one.
pub fn plan_windows(start: u64, stop: u64, batch_size: u64) -> Vec<(u64, u64)> {
    let size = batch_size.max(1);
    let mut windows = Vec::new();
    if start > stop {
        return windows;
    }

    let mut from = start;
    loop {
        let to = from.saturating_add(size - 1).min(stop);
        windows.push((from, to));
        if to >= stop {
            break;
        }
        from = to + 1;
    }

    windows
}

/// Rebases encoder timestamps onto the session's media clock.
///
/// The first frame of the session, video or audio, defines t = 0. Later
/// frames may come out negative if their producer lags the first one.
///
/// 会话内首帧（不区分类型）定义零点。
#[derive(Debug, Default, Clone)]
pub struct TimestampRebaser {
    base_us: Option<i64>,
    max_rebased_us: i64,
}

impl TimestampRebaser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebase(&mut self, pts_us: i64) -> i64 {
        let base = *self.base_us.get_or_insert(pts_us);
        let rebased = pts_us.saturating_sub(base);
        self.max_rebased_us = self.max_rebased_us.max(rebased);
        rebased
    }

    /// Largest rebased timestamp seen so far. Used as elapsed recording time.
    pub fn elapsed_us(&self) -> i64 {
        self.max_rebased_us
    }

    pub fn has_started(&self) -> bool {
        self.base_us.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_is_zero() {
        let mut r = TimestampRebaser::new();
        assert!(!r.has_started());
        assert_eq!(r.rebase(1000), 0);
        assert_eq!(r.rebase(1033), 33);
        assert_eq!(r.rebase(1066), 66);
        assert_eq!(r.elapsed_us(), 66);
    }

    #[test]
    fn earlier_frame_goes_negative_without_moving_elapsed() {
        let mut r = TimestampRebaser::new();
        r.rebase(5_000);
        r.rebase(6_000);
        assert_eq!(r.rebase(4_900), -100);
        assert_eq!(r.elapsed_us(), 1_000);
    }
}

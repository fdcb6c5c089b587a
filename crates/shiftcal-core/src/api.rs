use crate::shift::{ShiftPayload, ShiftRecord};

/// The remote store of shifts and of the default timezone preference.
///
/// Every call either resolves with data or fails; implementations own
/// transport concerns such as timeouts. Callers never retry.
pub trait ShiftApi {
    fn fetch_all_shifts(&self) -> anyhow::Result<Vec<ShiftRecord>>;

    fn create_shift(&self, payload: &ShiftPayload) -> anyhow::Result<ShiftRecord>;

    fn update_shift(&self, id: u64, payload: &ShiftPayload) -> anyhow::Result<ShiftRecord>;

    fn delete_shift(&self, id: u64) -> anyhow::Result<()>;

    /// IANA zone name, possibly empty when none was ever stored.
    fn get_default_timezone(&self) -> anyhow::Result<String>;

    fn set_default_timezone(&self, name: &str) -> anyhow::Result<String>;
}

impl<T: ShiftApi + ?Sized> ShiftApi for &T {
    fn fetch_all_shifts(&self) -> anyhow::Result<Vec<ShiftRecord>> {
        (**self).fetch_all_shifts()
    }

    fn create_shift(&self, payload: &ShiftPayload) -> anyhow::Result<ShiftRecord> {
        (**self).create_shift(payload)
    }

    fn update_shift(&self, id: u64, payload: &ShiftPayload) -> anyhow::Result<ShiftRecord> {
        (**self).update_shift(id, payload)
    }

    fn delete_shift(&self, id: u64) -> anyhow::Result<()> {
        (**self).delete_shift(id)
    }

    fn get_default_timezone(&self) -> anyhow::Result<String> {
        (**self).get_default_timezone()
    }

    fn set_default_timezone(&self, name: &str) -> anyhow::Result<String> {
        (**self).set_default_timezone(name)
    }
}

impl<T: ShiftApi + ?Sized> ShiftApi for Box<T> {
    fn fetch_all_shifts(&self) -> anyhow::Result<Vec<ShiftRecord>> {
        (**self).fetch_all_shifts()
    }

    fn create_shift(&self, payload: &ShiftPayload) -> anyhow::Result<ShiftRecord> {
        (**self).create_shift(payload)
    }

    fn update_shift(&self, id: u64, payload: &ShiftPayload) -> anyhow::Result<ShiftRecord> {
        (**self).update_shift(id, payload)
    }

    fn delete_shift(&self, id: u64) -> anyhow::Result<()> {
        (**self).delete_shift(id)
    }

    fn get_default_timezone(&self) -> anyhow::Result<String> {
        (**self).get_default_timezone()
    }

    fn set_default_timezone(&self, name: &str) -> anyhow::Result<String> {
        (**self).set_default_timezone(name)
    }
}

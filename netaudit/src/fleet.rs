//! Run one operation across many devices.
//!
//! Each device gets its own session, so devices share nothing. Sessions are
//! driven concurrently on the current task up to a fixed limit, and results
//! come back keyed by device name in inventory order whatever order the
//! devices finished in.

use futures_util::stream::{self, StreamExt};
use indexmap::IndexMap;
use log::{info, warn};

use crate::error::{Error, Result};
use crate::session::{DeviceCredentials, Session};
use crate::transport::{DeviceTransport, Transport};

/// Default number of devices worked on at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Per-device results, in inventory order.
#[derive(Debug)]
pub struct FleetReport<R> {
    results: IndexMap<String, Result<R>>,
}

impl<R> FleetReport<R> {
    pub fn get(&self, name: &str) -> Option<&Result<R>> {
        self.results.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<R>)> {
        self.results.iter().map(|(name, result)| (name.as_str(), result))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Devices whose operation failed.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.iter()
            .filter_map(|(name, result)| result.as_ref().err().map(|e| (name, e)))
    }

    /// Whether every device succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl<R> IntoIterator for FleetReport<R> {
    type Item = (String, Result<R>);
    type IntoIter = indexmap::map::IntoIter<String, Result<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// A set of devices to run operations on.
#[derive(Debug, Clone)]
pub struct Fleet {
    devices: Vec<DeviceCredentials>,
    concurrency: usize,
}

impl Fleet {
    /// Devices are reported under their names, which should be unique.
    pub fn new(devices: Vec<DeviceCredentials>) -> Self {
        Self {
            devices,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set how many devices are worked on at once (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn devices(&self) -> &[DeviceCredentials] {
        &self.devices
    }

    /// Connect to every device, run `task` on its session, then disconnect.
    pub async fn run<R, F>(&self, task: F) -> FleetReport<R>
    where
        F: AsyncFn(&mut Session) -> Result<R>,
    {
        self.run_with(Session::<DeviceTransport>::connect, task).await
    }

    /// Like [`run`](Self::run) with a custom way of opening sessions.
    pub async fn run_with<T, R, C, F>(&self, connect: C, task: F) -> FleetReport<R>
    where
        T: Transport,
        C: AsyncFn(DeviceCredentials) -> Result<Session<T>>,
        F: AsyncFn(&mut Session<T>) -> Result<R>,
    {
        let connect = &connect;
        let task = &task;

        info!(
            "running on {} device(s), {} at a time",
            self.devices.len(),
            self.concurrency
        );

        let devices = stream::iter(self.devices.iter().enumerate());
        let mut finished: Vec<(usize, String, Result<R>)> = devices
            .map(|(index, credentials)| async move {
                let name = credentials.name().to_string();
                let result = run_device(credentials.clone(), connect, task).await;
                match &result {
                    Ok(_) => info!("{name}: done"),
                    Err(e) => warn!("{name}: {e}"),
                }
                (index, name, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        finished.sort_by_key(|(index, _, _)| *index);
        FleetReport {
            results: finished
                .into_iter()
                .map(|(_, name, result)| (name, result))
                .collect(),
        }
    }
}

async fn run_device<T, R, C, F>(credentials: DeviceCredentials, connect: &C, task: &F) -> Result<R>
where
    T: Transport,
    C: AsyncFn(DeviceCredentials) -> Result<Session<T>>,
    F: AsyncFn(&mut Session<T>) -> Result<R>,
{
    let mut session = connect(credentials).await?;
    let result = task(&mut session).await;
    session.disconnect().await;
    result
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::session::test_support::privileged_device;
    use crate::testing::{ScriptBuilder, ScriptedTransport};

    fn device(name: &str) -> DeviceCredentials {
        DeviceCredentials::builder(name, "192.0.2.1")
            .username("admin")
            .password("pw")
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_results_in_inventory_order_with_failures() {
        let mut scripts: HashMap<String, ScriptBuilder> = HashMap::new();
        scripts.insert(
            "r1".to_string(),
            privileged_device().reply("show clock", "show clock\r\n10:00\r\nrouter#"),
        );
        scripts.insert("r2".to_string(), ScriptedTransport::new(""));
        scripts.insert(
            "r3".to_string(),
            privileged_device().reply("show clock", "show clock\r\n10:01\r\nrouter#"),
        );
        let scripts = Mutex::new(scripts);

        let connect = async |credentials: DeviceCredentials| {
            let script = scripts
                .lock()
                .unwrap()
                .remove(credentials.name())
                .unwrap();
            let (transport, _handle) = script.build();
            let platform = crate::platform::builtin(credentials.platform()).unwrap();
            Session::establish(transport, credentials, platform).await
        };

        let fleet = Fleet::new(vec![device("r1"), device("r2"), device("r3")]).with_concurrency(2);
        let report = fleet
            .run_with(connect, async |session: &mut Session<ScriptedTransport>| {
                session.run_show("show clock").await
            })
            .await;

        let names: Vec<&str> = report.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["r1", "r2", "r3"]);
        assert_eq!(report.get("r1").unwrap().as_ref().unwrap(), "10:00");
        assert!(matches!(report.get("r2"), Some(Err(Error::Timeout { .. }))));
        assert_eq!(report.get("r3").unwrap().as_ref().unwrap(), "10:01");
        assert!(!report.is_clean());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_concurrency_floor() {
        let fleet = Fleet::new(vec![device("r1")]).with_concurrency(0);
        assert_eq!(fleet.concurrency, 1);
    }
}

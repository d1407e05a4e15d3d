use crate::prelude::*;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct DatalogWriter {
    file: Arc<Mutex<std::fs::File>>,
    path: String,
    snapshots_written: Arc<Mutex<u64>>,
}

impl DatalogWriter {
    pub fn new(path: &str) -> Result<Self> {
        info!("Opening datalog file at {}", path);

        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to open datalog file {}: {}", path, e);
                return Err(e.into());
            }
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644)) {
                error!("Failed to set permissions on datalog file {}: {}", path, e);
                return Err(e.into());
            }
        }

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path: path.to_string(),
            snapshots_written: Arc::new(Mutex::new(0)),
        })
    }

    /// Appends the snapshot as one JSON line, stamped with `utc_timestamp`.
    pub fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        let mut json_data = match serde_json::to_value(snapshot)? {
            serde_json::Value::Object(map) => map,
            other => bail!("snapshot serialised to {} instead of an object", other),
        };
        json_data.insert("utc_timestamp".to_string(), serde_json::Value::Number(timestamp.into()));

        let json_string = serde_json::to_string(&serde_json::Value::Object(json_data))?;

        let mut file = self.file.lock().map_err(|_| anyhow!("Failed to lock datalog file"))?;
        if let Err(e) = writeln!(file, "{}", json_string).and_then(|_| file.flush()) {
            error!("Failed to write to datalog file {}: {}", self.path, e);
            return Err(e.into());
        }

        let mut written = self
            .snapshots_written
            .lock()
            .map_err(|_| anyhow!("Failed to lock snapshot counter"))?;
        *written += 1;
        debug!("Total snapshots stored in datalog file: {}", *written);

        Ok(())
    }

    pub fn snapshots_written(&self) -> u64 {
        self.snapshots_written.lock().map(|n| *n).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_snapshot() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("logs/datalog.json");
        let writer = DatalogWriter::new(path.to_str().ok_or_else(|| anyhow!("non utf-8 path"))?)?;

        let snapshot = Snapshot {
            battery_capacity_soc: 87,
            battery_voltage: Fixed2::from_hundredths(1280),
            charging_state: ChargingState::Floating,
            controller_faults: [ControllerFault::BatteryOverDischarge].into_iter().collect(),
            ..Default::default()
        };

        writer.write_snapshot(&snapshot)?;
        writer.write_snapshot(&Snapshot::default())?;
        assert_eq!(writer.snapshots_written(), 2);

        let contents = std::fs::read_to_string(&path)?;
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let json: serde_json::Value = serde_json::from_str(lines[0])?;
        assert_eq!(json["battery_capacity_soc"], 87);
        assert_eq!(json["battery_voltage"], "12.80");
        assert_eq!(json["charging_state"], "floating charging mode");
        assert_eq!(json["controller_faults"][0], "battery over discharge");
        assert!(json["utc_timestamp"].as_u64().is_some());

        Ok(())
    }

    #[test]
    fn test_appends_across_writers() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("datalog.json");
        let path = path.to_str().ok_or_else(|| anyhow!("non utf-8 path"))?;

        DatalogWriter::new(path)?.write_snapshot(&Snapshot::default())?;
        DatalogWriter::new(path)?.write_snapshot(&Snapshot::default())?;

        assert_eq!(std::fs::read_to_string(path)?.lines().count(), 2);
        Ok(())
    }
}

//! Device registration on the destination server.

use tracing::{info, warn};

use crate::errors::{chain_message, MigrateError};
use crate::migrate::script::DeviceScript;
use crate::server::ServerHandle;

/// Run the creation script on `destination` and refresh its catalog.
/// A refresh failure after a successful create only warns: the device exists.
pub fn register(destination: &mut dyn ServerHandle, script: &DeviceScript) -> Result<(), MigrateError> {
    destination
        .execute_non_query(&script.render())
        .map_err(|e| MigrateError::Registration {
            device: script.device_name.clone(),
            reason: chain_message(&e),
        })?;
    info!(
        device = %script.device_name,
        physical_location = %script.physical_location(),
        "Backup device created at destination"
    );

    if let Err(e) = destination.refresh_device_catalog() {
        warn!(
            device = %script.device_name,
            error = %chain_message(&e),
            "Device catalog refresh failed after create; snapshot may be stale"
        );
    }
    Ok(())
}

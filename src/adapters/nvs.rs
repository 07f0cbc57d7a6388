//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] with `u32` records.
//!
//! - Missing namespace or key maps to [`StorageError::NotFound`], the
//!   "never written" signal.
//! - Atomic writes: every entry of a batch is set on one handle and then
//!   committed once; ESP-IDF commits are atomic per `nvs_commit()`.
//! - The simulation backend keeps records in a `HashMap` and counts commits.

use crate::app::ports::StoragePort;
use crate::error::StorageError;
use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// NVS limits keys and namespaces to 15 bytes plus NUL.
const NVS_KEY_MAX: usize = 15;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, u32>,
    #[cfg(not(target_os = "espidf"))]
    commits: u32,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is erased
    /// and re-initialised automatically (cached addresses are lost and get
    /// rediscovered).
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32
            {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK as i32 {
                    return Err(StorageError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK as i32 {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK as i32 {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
            #[cfg(not(target_os = "espidf"))]
            commits: 0,
        })
    }

    /// Number of simulated commits.
    #[cfg(not(target_os = "espidf"))]
    pub fn commit_count(&self) -> u32 {
        self.commits
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of a key or namespace.
    fn c_name(name: &str) -> Result<[u8; NVS_KEY_MAX + 1], StorageError> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > NVS_KEY_MAX || bytes.contains(&0) {
            return Err(StorageError::IoError);
        }
        let mut buf = [0u8; NVS_KEY_MAX + 1];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(buf)
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns_buf = Self::c_name(namespace).map_err(|_| ESP_ERR_NVS_INVALID_NAME as i32)?;

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: `ns_buf` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }

        let result = f(handle);
        // SAFETY: `handle` was opened above and is not used afterwards.
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn map_err(code: i32) -> StorageError {
        if code == ESP_ERR_NVS_NOT_FOUND as i32 {
            StorageError::NotFound
        } else if code == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
            StorageError::Full
        } else {
            StorageError::IoError
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read_u32(&self, namespace: &str, key: &str) -> Result<u32, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            Self::c_name(key)?;
            self.store
                .get(&Self::composite_key(namespace, key))
                .copied()
                .ok_or(StorageError::NotFound)
        }

        #[cfg(target_os = "espidf")]
        {
            let key_buf = Self::c_name(key)?;
            Self::with_nvs_handle(namespace, false, |handle| {
                let mut value: u32 = 0;
                // SAFETY: valid handle, NUL-terminated key, valid out-pointer.
                let ret = unsafe { nvs_get_u32(handle, key_buf.as_ptr() as *const _, &mut value) };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(value)
            })
            .map_err(Self::map_err)
        }
    }

    fn write_u32_all(
        &mut self,
        namespace: &str,
        entries: &[(&str, u32)],
    ) -> Result<(), StorageError> {
        let mut keys: heapless::Vec<[u8; NVS_KEY_MAX + 1], 4> = heapless::Vec::new();
        for (key, _) in entries {
            keys.push(Self::c_name(key)?)
                .map_err(|_| StorageError::Full)?;
        }

        #[cfg(not(target_os = "espidf"))]
        {
            let _ = keys;
            for (key, value) in entries {
                self.store
                    .insert(Self::composite_key(namespace, key), *value);
            }
            self.commits += 1;
            info!(
                "NvsAdapter: committed {} record(s) (simulation)",
                entries.len()
            );
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                for (key_buf, (_, value)) in keys.iter().zip(entries) {
                    // SAFETY: valid handle and NUL-terminated key.
                    let ret = unsafe { nvs_set_u32(handle, key_buf.as_ptr() as *const _, *value) };
                    if ret != ESP_OK as i32 {
                        return Err(ret);
                    }
                }
                // SAFETY: valid handle.
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: committed {} record(s)", entries.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(Self::map_err(e))
                }
            }
        }
    }
}

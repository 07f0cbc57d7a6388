//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                  |
//! |------------|-----------------|------------------------------|
//! | `http`     | HttpTransport   | esp_http_client              |
//! | `log_sink` | EventSink       | Serial log output            |
//! | `netif`    | NetworkPort     | lwIP station netif + ARP     |
//! | `nvs`      | StoragePort     | NVS / in-memory store        |
//! | `time`     | Clock, DelayNs  | ESP32 system timer, FreeRTOS |
//! | `wifi`     | —               | ESP-IDF WiFi STA bring-up    |

pub mod http;
pub mod log_sink;
pub mod netif;
pub mod nvs;
pub mod time;
pub mod wifi;

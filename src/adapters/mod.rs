//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements            | Connects to                 |
//! |---------------|-----------------------|-----------------------------|
//! | `camera`      | Camera                | `rpicam-still` child process|
//! | `config_file` | ConfigPort            | JSON file on disk           |
//! | `hardware`    | RangeFinder + Feeder  | ultrasonic + dispenser      |
//! | `log_sink`    | EventSink             | `log` facade                |
//! | `reporter`    | EventSink             | HTTP status endpoint        |
//! | `rpi`         | embedded-hal traits   | Raspberry Pi GPIO (`rppal`) |
//! | `time`        | Clock, DelayNs        | `std::time` / `thread`      |

pub mod camera;
pub mod config_file;
pub mod hardware;
pub mod log_sink;
pub mod reporter;
#[cfg(feature = "rpi")]
pub mod rpi;
pub mod time;

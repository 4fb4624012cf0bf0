//! Terminal teleoperation panel: a virtual stick that streams
//! `geometry_msgs/Twist` commands and a live table of incoming telemetry.

pub mod app;
pub mod command;
pub mod config;
pub mod error;
pub mod input;
pub mod status;
pub mod table;
pub mod teleop;
pub mod telemetry;
pub mod transport;
pub mod ui;
pub mod viewer;

pub use command::{TwistMessage, Vector3, VelocityCommand};
pub use config::Config;
pub use error::{ConfigError, PanelError, TransportError};
pub use status::{ConnectionStatus, LifecycleEvent};
pub use table::{FieldRow, FieldTable};
pub use teleop::{CommandSink, CommandTranslator, GesturePhase, StickGesture};
pub use telemetry::{FieldValue, TelemetryRecord};
pub use transport::{LoopbackTransport, Transport, TransportEvent};
pub use viewer::{JoystickViewer, ViewerInfo};

//! larvaguard - Mosquito Larva Monitoring Core
//!
//! Asynchronous inference-and-decision pipeline for water-reservoir sensor
//! devices: photos uploaded by a device are run through Roboflow vision
//! inference in the background, the detections drive a SAFE/DANGER decision
//! and a per-device alert lifecycle, and the outcome is pushed to the Blynk
//! dashboard.
//!
//! ## Components
//!
//! 1. RoboflowClient - inference provider adapter (workflow + detection APIs)
//! 2. ResultParser - response normalization into detection counts
//! 3. DecisionEngine - pure status/action decision
//! 4. AlertService - per-device alert dedup and auto-resolution
//! 5. InferenceLogService - append-only audit trail of every job
//! 6. BlynkClient - best-effort dashboard notifications
//! 7. InferenceOrchestrator - owns the background job end to end
//!
//! The upload/HTTP layer, device auth and image storage live outside this
//! crate; they hand the orchestrator one [`InferenceJob`] per uploaded image
//! via [`InferenceOrchestrator::dispatch`] and never observe the outcome
//! synchronously.

pub mod alert_service;
pub mod blynk_client;
pub mod config;
pub mod decision_engine;
pub mod error;
pub mod inference_log_service;
pub mod inference_orchestrator;
pub mod result_parser;
pub mod roboflow_client;

pub use error::{Error, Result};
pub use inference_orchestrator::{InferenceJob, InferenceOrchestrator};

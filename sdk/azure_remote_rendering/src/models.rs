//! Wire types for the Remote Rendering REST API.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// The status of an asset conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConversionStatus {
    /// The conversion has been accepted but work has not started.
    NotStarted,
    /// The conversion is running.
    Running,
    /// The conversion was cancelled.
    Cancelled,
    /// The conversion failed.
    Failed,
    /// The conversion produced an asset.
    Succeeded,
}

/// Where the input asset is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionInputSettings {
    /// URI of the Azure blob storage container containing the input model.
    pub storage_container_uri: String,

    /// Optional SAS token granting read and list access to the container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_container_read_list_sas: Option<String>,

    /// Only blobs under this prefix are considered part of the input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_prefix: Option<String>,

    /// Path of the model file to convert, relative to the blob prefix.
    pub relative_input_asset_path: String,
}

/// Where the converted asset is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutputSettings {
    /// URI of the Azure blob storage container the asset is written into.
    pub storage_container_uri: String,

    /// Optional SAS token granting write access to the container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_container_write_sas: Option<String>,

    /// Prefix the output blobs are written under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_prefix: Option<String>,

    /// Filename of the generated asset. Must end in `.arrAsset`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_asset_filename: Option<String>,
}

/// Input and output configuration of a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSettings {
    pub input_location: ConversionInputSettings,
    pub output_location: ConversionOutputSettings,
}

/// Request body for creating a conversion.
#[derive(Debug, Clone, Serialize)]
pub struct CreateConversionSettings {
    pub settings: ConversionSettings,
}

/// Output produced by a successful conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutput {
    /// URI of the generated `.arrAsset` blob.
    pub output_asset_uri: Option<String>,
}

/// Error details reported by the service inside a resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRenderingServiceError {
    pub code: String,
    pub message: String,
}

/// An asset conversion tracked by the service.
///
/// The `status` field advances server-side; a conversion is observed until
/// it reaches `Failed` or `Succeeded`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    /// The conversion identifier, unique within the account.
    pub id: String,

    /// The settings the conversion was created with.
    pub settings: Option<ConversionSettings>,

    /// Output information, present once the conversion succeeded.
    pub output: Option<ConversionOutput>,

    /// Error details, present when the conversion failed.
    pub error: Option<RemoteRenderingServiceError>,

    /// Current status of the conversion.
    pub status: Option<ConversionStatus>,

    /// When the conversion was created (ISO-8601).
    pub creation_time: Option<String>,
}

// ---------------------------------------------------------------------------
// Rendering sessions
// ---------------------------------------------------------------------------

/// The status of a rendering session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    /// The session is being provisioned.
    Starting,
    /// The session is up and accepting connections.
    Ready,
    /// The session was stopped.
    Stopped,
    /// The session's lease ran out.
    Expired,
    /// The session ended in an error.
    Error,
}

/// Size of the server backing a rendering session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionSize {
    /// Standard size, with a hard maximum scene complexity.
    Standard,
    /// Premium size, with no enforced maximum.
    Premium,
}

/// Request body for creating a rendering session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionSettings {
    /// Server size to allocate.
    pub size: SessionSize,

    /// Time in minutes the session runs after reaching `Ready`.
    pub max_lease_time_minutes: u32,
}

/// Request body for extending a session's lease.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionSettings {
    /// The new lease time; must be strictly larger than the previous one.
    pub max_lease_time_minutes: u32,
}

/// A rendering session tracked by the service.
///
/// A session is observed until it reaches `Expired`, `Error`, `Stopped` or
/// `Ready` - `Ready` is terminal for the poller even though the session
/// keeps serving afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderingSession {
    /// The session identifier, unique within the account.
    pub id: String,

    /// Port for the ArrInspector diagnostic tool.
    pub arr_inspector_port: Option<u16>,

    /// Port used by the runtime handshake.
    pub handshake_port: Option<u16>,

    /// Minutes the session has been in the `Ready` state.
    pub elapsed_time_minutes: Option<u32>,

    /// Hostname to connect the runtime to, present once `Ready`.
    pub hostname: Option<String>,

    /// The lease time the session was created or updated with.
    pub max_lease_time_minutes: Option<u32>,

    /// Server size backing the session.
    pub size: Option<SessionSize>,

    /// Current status of the session.
    pub status: Option<SessionStatus>,

    /// Error details, present when the session ended in an error.
    pub error: Option<RemoteRenderingServiceError>,

    /// When the session was created (ISO-8601).
    pub creation_time: Option<String>,
}

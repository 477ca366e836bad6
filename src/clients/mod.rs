pub mod registry_client;
pub mod remote_registry;

pub use registry_client::HttpRegistryClient;
pub use remote_registry::RemoteRegistry;

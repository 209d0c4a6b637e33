//! Core services.
//!
//! Services orchestrate between ports and path logic; they never know about
//! concrete adapters.

mod kernel_search_paths;

pub use kernel_search_paths::{
    JUPYTER_KERNEL_PATHS_KEY, KERNELSPEC_ROOT_PATH_KEY, KernelSearchPathService, ServiceOptions,
};

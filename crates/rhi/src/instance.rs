//! Vulkan instance management.
//!
//! This module handles VkInstance creation, validation layers, and the debug
//! messenger.
//!
//! # Overview
//!
//! The [`Instance`] struct provides a safe abstraction over the Vulkan
//! instance. Validation-layer messages are delivered to a [`DiagnosticSink`]
//! injected at construction; the sink is owned by the instance and lives
//! exactly as long as the messenger that calls into it. There is no global
//! callback state.
//!
//! # Example
//!
//! ```no_run
//! use prism_rhi::instance::Instance;
//!
//! // Surface extensions come from ash-window for the running display server.
//! # fn example(surface_extensions: &[*const i8]) -> Result<(), prism_rhi::RhiError> {
//! let instance = Instance::new(c"my-app", surface_extensions, cfg!(debug_assertions), None)?;
//! let vk_instance = instance.handle();
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::ffi::CStr;

use ash::{Entry, vk};
use tracing::{error, info, warn};

use crate::error::RhiError;

/// The Khronos validation layer name.
const VALIDATION_LAYER_NAME: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Severity of a validation or driver diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticSeverity {
    Verbose,
    Info,
    Warning,
    Error,
}

impl DiagnosticSeverity {
    fn from_vk(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        match severity {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => Self::Error,
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => Self::Warning,
            vk::DebugUtilsMessageSeverityFlagsEXT::INFO => Self::Info,
            _ => Self::Verbose,
        }
    }
}

/// Receiver for validation-layer and driver diagnostics.
///
/// Implementations must be `Send + Sync`: the driver may invoke the debug
/// messenger from any thread.
pub trait DiagnosticSink: Send + Sync {
    /// Called once per diagnostic message.
    ///
    /// `kind` is the message category reported by the driver ("Validation",
    /// "Performance", "General").
    fn message(&self, severity: DiagnosticSeverity, kind: &str, message: &str);
}

/// Default sink that forwards diagnostics to `tracing`.
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn message(&self, severity: DiagnosticSeverity, kind: &str, message: &str) {
        match severity {
            DiagnosticSeverity::Error => error!("[Vulkan {}] {}", kind, message),
            DiagnosticSeverity::Warning => warn!("[Vulkan {}] {}", kind, message),
            DiagnosticSeverity::Info => info!("[Vulkan {}] {}", kind, message),
            DiagnosticSeverity::Verbose => tracing::debug!("[Vulkan {}] {}", kind, message),
        }
    }
}

/// Heap cell handed to the messenger as its user-data pointer.
///
/// Boxed separately from [`Instance`] so the address stays stable when the
/// instance value moves.
struct SinkCell {
    sink: Box<dyn DiagnosticSink>,
}

/// Vulkan instance wrapper with optional validation layer support.
///
/// Manages the lifetime of the Vulkan instance, the debug messenger, and the
/// diagnostic sink the messenger dispatches to. Dropping the instance
/// destroys the messenger before the sink, so no callback can observe a dead
/// sink.
pub struct Instance {
    /// Vulkan entry point loader
    entry: Entry,
    /// Vulkan instance handle
    instance: ash::Instance,
    /// Debug utils extension loader (only present when validation is enabled)
    debug_utils: Option<ash::ext::debug_utils::Instance>,
    /// Debug messenger handle (only present when validation is enabled)
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    /// Sink the messenger callback dispatches to
    diagnostics: Option<Box<SinkCell>>,
}

impl Instance {
    /// Creates a new Vulkan instance.
    ///
    /// # Arguments
    ///
    /// * `app_name` - Application name reported to the driver
    /// * `surface_extensions` - Instance extensions required for presentation
    ///   on the running display server (from `ash_window`)
    /// * `enable_validation` - If true, enables the validation layer and a
    ///   debug messenger (when the layer is installed)
    /// * `diagnostics` - Sink receiving messenger output; defaults to
    ///   [`TracingSink`] when `None`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The Vulkan library cannot be loaded
    /// - Instance creation fails
    /// - Debug messenger setup fails (when validation is enabled)
    pub fn new(
        app_name: &CStr,
        surface_extensions: &[*const i8],
        enable_validation: bool,
        diagnostics: Option<Box<dyn DiagnosticSink>>,
    ) -> Result<Self, RhiError> {
        // Load the Vulkan library
        let entry = unsafe { Entry::load()? };

        let validation_available =
            enable_validation && Self::is_validation_layer_available(&entry)?;
        if enable_validation && !validation_available {
            warn!("Validation layer requested but not available, proceeding without it");
        }

        let app_info = vk::ApplicationInfo::default()
            .application_name(app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"prism")
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_3);

        let mut extensions = surface_extensions.to_vec();
        if validation_available {
            extensions.push(ash::ext::debug_utils::NAME.as_ptr());
        }

        let layers = if validation_available {
            vec![VALIDATION_LAYER_NAME.as_ptr()]
        } else {
            vec![]
        };

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(RhiError::from)?
        };

        info!("Vulkan instance created (API version 1.3)");

        // Install the messenger with the sink cell as its user data. The cell
        // is boxed so its address survives moves of the Instance value.
        let (debug_utils, debug_messenger, diagnostics) = if validation_available {
            let cell = Box::new(SinkCell {
                sink: diagnostics.unwrap_or_else(|| Box::new(TracingSink)),
            });
            let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
            let messenger = Self::setup_debug_messenger(&debug_utils, &cell)?;
            info!("Validation layers enabled, debug messenger installed");
            (Some(debug_utils), Some(messenger), Some(cell))
        } else {
            (None, None, None)
        };

        Ok(Self {
            entry,
            instance,
            debug_utils,
            debug_messenger,
            diagnostics,
        })
    }

    /// Returns the Vulkan instance handle.
    #[inline]
    pub fn handle(&self) -> &ash::Instance {
        &self.instance
    }

    /// Returns the Vulkan entry point loader.
    #[inline]
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Returns whether validation layers are enabled.
    #[inline]
    pub fn has_validation(&self) -> bool {
        self.debug_messenger.is_some()
    }

    /// Checks if the Khronos validation layer is available.
    fn is_validation_layer_available(entry: &Entry) -> Result<bool, RhiError> {
        let available_layers = unsafe { entry.enumerate_instance_layer_properties()? };

        let validation_layer_name = VALIDATION_LAYER_NAME.to_bytes_with_nul();

        let found = available_layers.iter().any(|layer| {
            let layer_name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };
            layer_name.to_bytes_with_nul() == validation_layer_name
        });

        Ok(found)
    }

    /// Sets up the debug messenger dispatching to `cell`.
    fn setup_debug_messenger(
        debug_utils: &ash::ext::debug_utils::Instance,
        cell: &SinkCell,
    ) -> Result<vk::DebugUtilsMessengerEXT, RhiError> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback))
            .user_data(cell as *const SinkCell as *mut std::ffi::c_void);

        let messenger = unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(RhiError::from)?
        };

        Ok(messenger)
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            // Destroy the messenger before the instance; the sink cell is
            // dropped after both, once no callback can reference it.
            if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils, self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        info!("Vulkan instance destroyed");
    }
}

/// Debug callback invoked by the validation layer.
///
/// Dispatches to the [`DiagnosticSink`] carried in the user-data pointer.
///
/// # Safety
///
/// Called from the Vulkan driver; the user-data pointer is the `SinkCell`
/// owned by the [`Instance`] that installed this messenger, which outlives
/// the messenger.
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || user_data.is_null() {
        return vk::FALSE;
    }

    let callback_data = unsafe { &*p_callback_data };
    let message = if callback_data.p_message.is_null() {
        Cow::Borrowed("(no message)")
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message).to_string_lossy() }
    };

    let kind = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "General",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "Validation",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "Performance",
        _ => "Unknown",
    };

    let cell = unsafe { &*(user_data as *const SinkCell) };
    cell.sink
        .message(DiagnosticSeverity::from_vk(message_severity), kind, &message);

    // Returning VK_FALSE indicates the triggering call should not be aborted
    vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(
            DiagnosticSeverity::from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR),
            DiagnosticSeverity::Error
        );
        assert_eq!(
            DiagnosticSeverity::from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING),
            DiagnosticSeverity::Warning
        );
        assert_eq!(
            DiagnosticSeverity::from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::INFO),
            DiagnosticSeverity::Info
        );
        assert_eq!(
            DiagnosticSeverity::from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE),
            DiagnosticSeverity::Verbose
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(DiagnosticSeverity::Error > DiagnosticSeverity::Warning);
        assert!(DiagnosticSeverity::Warning > DiagnosticSeverity::Info);
        assert!(DiagnosticSeverity::Info > DiagnosticSeverity::Verbose);
    }

    #[test]
    fn test_instance_creation_without_validation() {
        // Requires a Vulkan loader; skipped where unavailable
        let result = Instance::new(c"prism-test", &[], false, None);
        match result {
            Ok(instance) => {
                assert!(!instance.has_validation());
            }
            Err(RhiError::LoadingError(_)) => {
                eprintln!("Skipping test: Vulkan not available");
            }
            Err(RhiError::VulkanError(_)) => {
                eprintln!("Skipping test: no usable Vulkan driver");
            }
            Err(e) => {
                panic!("Unexpected error: {:?}", e);
            }
        }
    }

    #[test]
    fn test_sink_is_object_safe() {
        struct NullSink;
        impl DiagnosticSink for NullSink {
            fn message(&self, _: DiagnosticSeverity, _: &str, _: &str) {}
        }
        let sink: Box<dyn DiagnosticSink> = Box::new(NullSink);
        sink.message(DiagnosticSeverity::Info, "General", "ok");
    }
}

//! Optional CPU pinning for the bound thread.
//!
//! Binding an executor to a thread is about *which* thread runs the work; this
//! module additionally restricts *where* that thread is scheduled.
//!
//! Linux:
//!   - CPU pin: pthread_setaffinity_np on the current thread.
//!   - NUMA mem policy: set_mempolicy(MPOL_BIND, nodemask), best-effort.
//! macOS:
//!   - Affinity tag: thread_policy_set(THREAD_AFFINITY_POLICY).
//!
//! Other platforms accept the configuration and do nothing.

use std::io;

/// Pinning configuration applied by the bound thread when `run` starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinConfig {
    /// Logical core to pin the bound OS thread to.
    pub core_id: Option<usize>,
    /// NUMA node for memory binding (Linux only).
    pub numa_node: Option<u16>,
    /// Whether to apply MPOL_BIND when `numa_node` is set (Linux only).
    pub mem_bind: bool,
    /// Mach thread affinity tag (macOS only).
    pub mac_affinity_tag: Option<i32>,
}

impl PinConfig {
    /// Pin to a single logical core.
    pub fn core(core_id: usize) -> Self {
        Self {
            core_id: Some(core_id),
            ..Self::default()
        }
    }

    /// True when applying this configuration would be a no-op everywhere.
    pub fn is_empty(&self) -> bool {
        self.core_id.is_none() && self.numa_node.is_none() && self.mac_affinity_tag.is_none()
    }
}

/// Apply `cfg` to the calling thread.
///
/// The NUMA memory policy is best-effort and only logged on failure; a failed
/// core pin is returned as an error.
pub fn pin_current_thread(cfg: &PinConfig) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        linux::apply(cfg)
    }

    #[cfg(target_os = "macos")]
    {
        macos::apply(cfg)
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        if !cfg.is_empty() {
            log::debug!("thread pinning unsupported on this platform; ignoring {cfg:?}");
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use std::io;
    use std::mem::{size_of, zeroed};

    use super::PinConfig;

    const MPOL_BIND: libc::c_long = 2;

    pub(super) fn apply(cfg: &PinConfig) -> io::Result<()> {
        if let Some(core) = cfg.core_id {
            if core >= libc::CPU_SETSIZE as usize {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("core id {core} exceeds CPU_SETSIZE"),
                ));
            }
            // SAFETY: cpu_set_t is plain data; zeroed is its empty set.
            let rc = unsafe {
                let mut set: libc::cpu_set_t = zeroed();
                libc::CPU_SET(core, &mut set);
                libc::pthread_setaffinity_np(libc::pthread_self(), size_of::<libc::cpu_set_t>(), &set)
            };
            if rc != 0 {
                return Err(io::Error::from_raw_os_error(rc));
            }
            log::debug!("pinned bound thread to core {core}");
        }

        if let (Some(node), true) = (cfg.numa_node, cfg.mem_bind) {
            if node < 64 {
                let mask: u64 = 1u64 << node;
                // SAFETY: mask outlives the call and maxnode matches its width.
                let res = unsafe {
                    libc::syscall(
                        libc::SYS_set_mempolicy,
                        MPOL_BIND,
                        &mask as *const u64,
                        64 as libc::c_long,
                    )
                };
                if res != 0 {
                    log::warn!(
                        "set_mempolicy(MPOL_BIND, node {node}) failed: {}",
                        io::Error::last_os_error()
                    );
                }
            } else {
                log::warn!("numa node {node} out of range; memory policy not applied");
            }
        }
        Ok(())
    }
}

#[cfg(target_os = "macos")]
mod macos {
    use std::io;

    use super::PinConfig;

    #[allow(non_camel_case_types)]
    type thread_t = libc::mach_port_t;

    #[allow(non_camel_case_types)]
    #[repr(C)]
    struct thread_affinity_policy_data_t {
        affinity_tag: libc::integer_t,
    }

    unsafe extern "C" {
        fn mach_thread_self() -> thread_t;
        fn thread_policy_set(
            thread: thread_t,
            flavor: libc::c_int,
            policy_info: *const libc::integer_t,
            count: libc::mach_msg_type_number_t,
        ) -> libc::kern_return_t;
    }

    const THREAD_AFFINITY_POLICY: libc::c_int = 4;

    pub(super) fn apply(cfg: &PinConfig) -> io::Result<()> {
        let Some(tag) = cfg.mac_affinity_tag else {
            return Ok(());
        };
        let pol = thread_affinity_policy_data_t {
            affinity_tag: tag as libc::integer_t,
        };
        let cnt = (size_of::<thread_affinity_policy_data_t>() / size_of::<libc::integer_t>())
            as libc::mach_msg_type_number_t;
        // SAFETY: pol is a valid policy struct for the duration of the call.
        let kr = unsafe {
            thread_policy_set(
                mach_thread_self(),
                THREAD_AFFINITY_POLICY,
                (&pol as *const thread_affinity_policy_data_t).cast::<libc::integer_t>(),
                cnt,
            )
        };
        if kr != 0 {
            return Err(io::Error::other(format!("thread_policy_set failed: {kr}")));
        }
        log::debug!("applied mach affinity tag {tag} to bound thread");
        Ok(())
    }
}

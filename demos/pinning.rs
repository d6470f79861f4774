use thread_affine::prelude::*;

fn main() -> Result<(), ExecutorError> {
    #[cfg(target_os = "linux")]
    let pin = PinConfig {
        core_id: Some(0),
        numa_node: Some(0),
        mem_bind: true,
        mac_affinity_tag: None,
    };

    #[cfg(target_os = "macos")]
    let pin = PinConfig {
        core_id: None,
        numa_node: None,
        mem_bind: false,
        mac_affinity_tag: Some(1),
    };

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    let pin = PinConfig::default();

    let (executor, handle) = Builder::new().name("pinned").pin(pin).spawn()?;
    let id = executor.call(|| std::thread::current().id())?;
    println!("pinned executor bound to {id:?}");
    executor.stop()?;
    handle.join().expect("bound thread panicked")
}

//! Process-wide loader lifecycle
//!
//! Runs as its own test binary so the global loader starts empty. Everything
//! lives in one test because the instance is shared by the whole process.

use std::sync::Arc;
use envgate::gate::{
    EnvironmentSnapshot, GateError, GateState, HookDispatcher, Loader, LoaderBuilder,
    SimulatedHost, SimulatedRuntime,
};

#[test]
fn test_singleton_lifecycle() {
    assert!(Loader::instance().is_none());

    let host = Arc::new(SimulatedHost::new(EnvironmentSnapshot::new("7.4", "5.8", Some("4.5"))));
    let runtime = Arc::new(SimulatedRuntime::new());

    let first = Loader::get_instance(|| LoaderBuilder::new(host.clone(), runtime.clone()));
    let second = Loader::get_instance(|| panic!("factory must not run twice"));
    assert!(std::ptr::eq(first, second));
    assert!(std::ptr::eq(first, Loader::instance().unwrap()));

    // a second installation is refused and reported to the host
    let other_host = Arc::new(SimulatedHost::new(EnvironmentSnapshot::new("8.2", "6.4", Some("8.0"))));
    let err = Loader::install(LoaderBuilder::new(other_host.clone(), Arc::new(SimulatedRuntime::new())))
        .err()
        .unwrap();
    assert!(matches!(err, GateError::SingletonMisuse { .. }));
    assert_eq!(other_host.diagnostics().len(), 1);
    assert!(other_host.registered_hooks().is_empty());

    // the original instance keeps serving requests
    let basename = first.manifest().basename.clone();
    let dispatcher = HookDispatcher::new(&host, &basename);
    dispatcher.run_activation_request(first).unwrap();
    for _ in 0..10 {
        let again = Loader::get_instance(|| panic!("factory must not run twice"));
        dispatcher.run_admin_request(again);
    }

    assert_eq!(first.state(), GateState::Activated);
    assert!(first.is_initialized());
    assert_eq!(runtime.entry_point_calls(), 1);
}

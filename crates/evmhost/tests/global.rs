//! Process-wide factory installation.

use evmhost::{FactoryError, HostConfig, VmFactory};
use evmhost_abi::ExecutionContext;

#[test]
fn test_install_once_then_global() {
    assert!(matches!(VmFactory::global(), Err(FactoryError::NotInstalled)));

    let mut config = HostConfig::new();
    config.add_option("stack-limit", "64");
    let installed = config.finalize().install().unwrap();
    assert_eq!(installed.options().len(), 1);

    let global = VmFactory::global().unwrap();
    assert!(std::ptr::eq(installed, global));

    let second = HostConfig::new().finalize().install();
    assert!(matches!(second, Err(FactoryError::AlreadyInstalled)));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                let mut vm = VmFactory::global().unwrap().create(None).unwrap();
                let mut gas = 1000;
                vm.exec(&mut gas, &ExecutionContext::new(&[0x00]), None)
                    .unwrap()
                    .is_success()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

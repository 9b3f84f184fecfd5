mod sysinfo_space;

pub use sysinfo_space::SysinfoStorageSpace;

use kernel_info::memory::ptov;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage};
use kernel_vmem::{AddressSpaceError, FrameArena, Level, build_kernel_address_space};

#[test]
fn kernel_map_is_reachable_from_the_crate_root() {
    let mut frames = FrameArena::<8>::new(PhysicalPage::from_frame_number(0x2000));
    let text = ptov(PhysicalAddress::new(0x1000))..ptov(PhysicalAddress::new(0x2000));
    let space =
        build_kernel_address_space(&mut frames, PhysicalAddress::new(0x10_0000), text).unwrap();

    let pa = PhysicalAddress::new(0x1000);
    let (level, entry) = space.entry(&frames, ptov(pa)).unwrap().unwrap();
    assert_eq!(level, Level::Pt);
    assert!(!entry.writable());
    assert_eq!(space.query(&frames, ptov(pa + 0x10)).unwrap(), Some(pa + 0x10));
}

#[test]
fn too_few_frames_is_an_out_of_memory_error() {
    let mut frames = FrameArena::<2>::new(PhysicalPage::from_frame_number(0x2000));
    let text = ptov(PhysicalAddress::new(0x1000))..ptov(PhysicalAddress::new(0x2000));
    let err = build_kernel_address_space(&mut frames, PhysicalAddress::new(0x10_0000), text)
        .unwrap_err();
    assert!(matches!(err, AddressSpaceError::OutOfMemory { .. }));
}

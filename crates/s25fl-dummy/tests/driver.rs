//! Driver behaviour against the emulated chip

use s25fl_core::block::BlockDevice;
use s25fl_core::device::{Config, S25fl064l, BLOCK_COUNT, BLOCK_SIZE, PAGE_SIZE};
use s25fl_core::memtest::{raw_memtest, Fault};
use s25fl_core::protocol::{self, BusyPolicy};
use s25fl_core::register::{ErrorStatus, Impedance, Status2};
use s25fl_core::spi::{opcodes, AddressWidth};
use s25fl_core::Error;
use s25fl_dummy::{BusEvent, DummyConfig, DummyError, DummyFlash};

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

/// Transfers (tx bytes, rx length) made inside windows that start with `opcode`
fn window_transfers(flash: &DummyFlash, opcode: u8) -> Vec<Vec<(Vec<u8>, usize)>> {
    let mut windows = Vec::new();
    let mut current: Option<Vec<(Vec<u8>, usize)>> = None;
    for event in flash.events() {
        match event {
            BusEvent::Select => current = Some(Vec::new()),
            BusEvent::Transfer { tx, rx_len } => {
                if let Some(window) = current.as_mut() {
                    window.push((tx.clone(), *rx_len));
                }
            }
            BusEvent::Deselect => {
                if let Some(window) = current.take() {
                    if window.first().and_then(|(tx, _)| tx.first()) == Some(&opcode) {
                        windows.push(window);
                    }
                }
            }
            _ => {}
        }
    }
    windows
}

#[test]
fn test_initialize_reads_identity() {
    let mut flash = DummyFlash::new_default();
    let mut dev = S25fl064l::new(&mut flash);
    assert!(!dev.is_initialized());

    dev.initialize().unwrap();

    assert!(dev.is_initialized());
    assert!(dev.verify_identity());
    assert_eq!(dev.manufacturer_id(), 0x01);
    assert_eq!(dev.device_id(), 0x6017);
    assert_eq!(
        dev.unique_id(),
        [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]
    );
    assert!(dev.flash_params().unwrap().is_valid());
    assert!(dev.short_address());
    assert!(!dev.qpi_mode());
    assert_eq!(dev.impedance(), Impedance::Imp3);
    assert_eq!(dev.block_size(), BLOCK_SIZE);
    assert_eq!(dev.block_count(), BLOCK_COUNT);
    assert_eq!(dev.size(), 8 * 1024 * 1024);

    let flash = dev.transport();
    assert_eq!(
        flash.commands(),
        vec![
            opcodes::RES,
            opcodes::RDSR1,
            opcodes::RDID,
            opcodes::RUID,
            opcodes::RSFDP,
            opcodes::RDCR2,
        ]
    );
    assert!(flash.events().contains(&BusEvent::Reset));
    assert!(flash.cs_balanced());
}

#[test]
fn test_initialize_accepts_foreign_identity() {
    let config = DummyConfig {
        manufacturer_id: 0xEF,
        device_id: 0x4018,
        config2: 0x01,
        ..Default::default()
    };
    let mut flash = DummyFlash::new(config);
    let mut dev = S25fl064l::new(&mut flash);

    dev.initialize().unwrap();

    assert!(dev.is_initialized());
    assert!(!dev.verify_identity());
    assert_eq!(dev.manufacturer_id(), 0xEF);
    assert_eq!(dev.device_id(), 0x4018);
    assert!(!dev.short_address());
    assert_eq!(dev.address_width(), AddressWidth::FourByte);
    assert_eq!(dev.impedance(), Impedance::Imp0);
}

#[test]
fn test_initialize_with_bad_sfdp_signature() {
    let mut config = DummyConfig::default();
    config.sfdp[0] = 0x00;
    let mut flash = DummyFlash::new(config);
    let mut dev = S25fl064l::new(&mut flash);

    dev.initialize().unwrap();

    assert!(dev.is_initialized());
    assert!(!dev.flash_params().unwrap().is_valid());
}

#[test]
fn test_initialize_wakes_from_power_down() {
    let mut flash = DummyFlash::new_default();
    let mut dev = S25fl064l::new(&mut flash);

    dev.enter_power_down().unwrap();
    assert!(dev.is_powered_down());
    assert!(dev.transport().is_powered_down());

    dev.initialize().unwrap();
    assert!(!dev.is_powered_down());
    assert!(!dev.transport().is_powered_down());
    assert!(dev.verify_identity());
    // Wake-up from deep power-down keeps the chip busy for a while
    assert_eq!(dev.transport().busy_hook_calls(), 2);
}

#[test]
fn test_power_down_and_release() {
    let mut flash = DummyFlash::new_default();
    let mut dev = S25fl064l::new(&mut flash);
    dev.initialize().unwrap();

    dev.enter_power_down().unwrap();
    assert!(dev.transport().is_powered_down());
    // Only RES is decoded in deep power-down
    let (mfr, _) = protocol::read_id(dev.transport_mut()).unwrap();
    assert_eq!(mfr, 0xFF);

    dev.transport_mut().clear_events();
    dev.leave_power_down().unwrap();
    assert!(!dev.is_powered_down());
    assert!(!dev.transport().is_powered_down());
    // RES, then polls until the wake-up latency has passed
    assert_eq!(
        dev.transport().commands(),
        vec![opcodes::RES, opcodes::RDSR1, opcodes::RDSR1, opcodes::RDSR1]
    );
    let (mfr, dev_id) = protocol::read_id(dev.transport_mut()).unwrap();
    assert_eq!((mfr, dev_id), (0x01, 0x6017));
}

#[test]
fn test_reset_clears_initialized() {
    let mut flash = DummyFlash::new_default();
    let mut dev = S25fl064l::new(&mut flash);
    dev.initialize().unwrap();

    dev.reset();

    assert!(!dev.is_initialized());
    assert_eq!(dev.transport().events().last(), Some(&BusEvent::Reset));
}

#[test]
fn test_single_page_write() {
    let mut flash = DummyFlash::new_default();
    let mut dev = S25fl064l::new(&mut flash);
    dev.initialize().unwrap();
    dev.transport_mut().clear_events();

    let data = pattern(16);
    dev.write(0x0001_0000, &data).unwrap();

    let flash = dev.transport();
    assert_eq!(flash.count_command(opcodes::WREN), 1);
    assert_eq!(flash.count_command(opcodes::PP_4B), 1);

    let windows = window_transfers(flash, opcodes::PP_4B);
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0][0], (vec![opcodes::PP_4B, 0x00, 0x01, 0x00, 0x00], 0));
    assert_eq!(windows[0][1], (data.clone(), 0));
    assert_eq!(&flash.data()[0x1_0000..0x1_0010], &data[..]);
    assert!(flash.cs_balanced());

    // The program is followed by a busy-wait that saw the chip busy
    let commands = flash.commands();
    let pp = commands.iter().position(|&op| op == opcodes::PP_4B).unwrap();
    assert_eq!(&commands[pp + 1..pp + 3], &[opcodes::RDSR1, opcodes::RDSR1]);
    assert_eq!(flash.busy_hook_calls(), 2);
}

#[test]
fn test_full_page_split_below_transfer_limit() {
    let mut flash = DummyFlash::new_default();
    let data = pattern(256);

    protocol::program(&mut flash, 0, &data, PAGE_SIZE, BusyPolicy::default()).unwrap();

    let windows = window_transfers(&flash, opcodes::PP_4B);
    assert_eq!(windows.len(), 1);
    let lengths: Vec<usize> = windows[0].iter().map(|(tx, _)| tx.len()).collect();
    assert_eq!(lengths, vec![5, 255, 1]);
    assert_eq!(&flash.data()[..256], &data[..]);
}

#[test]
fn test_small_transfer_limit() {
    let config = DummyConfig {
        max_transfer_len: 16,
        ..Default::default()
    };
    let mut flash = DummyFlash::new(config);
    let data = pattern(100);

    protocol::program(&mut flash, 0x200, &data, PAGE_SIZE, BusyPolicy::default()).unwrap();
    let mut buf = vec![0u8; 100];
    protocol::read(&mut flash, 0x200, &mut buf).unwrap();

    assert_eq!(buf, data);
    for event in flash.events() {
        if let BusEvent::Transfer { tx, rx_len } = event {
            assert!(tx.len() <= 16 && *rx_len <= 16);
        }
    }
}

#[test]
fn test_multi_page_write_issues_one_program_per_page() {
    let mut flash = DummyFlash::new_default();
    let data = pattern(3 * 256 + 1);

    protocol::program(&mut flash, 0, &data, PAGE_SIZE, BusyPolicy::default()).unwrap();

    assert_eq!(flash.count_command(opcodes::PP_4B), 4);
    assert_eq!(flash.count_command(opcodes::WREN), 4);

    let addresses: Vec<Vec<u8>> = window_transfers(&flash, opcodes::PP_4B)
        .into_iter()
        .map(|w| w[0].0[1..].to_vec())
        .collect();
    assert_eq!(
        addresses,
        vec![
            vec![0, 0, 0x00, 0x00],
            vec![0, 0, 0x01, 0x00],
            vec![0, 0, 0x02, 0x00],
            vec![0, 0, 0x03, 0x00],
        ]
    );
    assert_eq!(&flash.data()[..data.len()], &data[..]);
}

#[test]
fn test_write_read_round_trip() {
    let mut flash = DummyFlash::new_default();
    let mut dev = S25fl064l::new(&mut flash);
    dev.initialize().unwrap();

    dev.erase_sector(0x2000).unwrap();
    let data = pattern(1000);
    dev.write(0x2000, &data).unwrap();

    let mut buf = vec![0u8; 1000];
    dev.read(0x2000, &mut buf).unwrap();
    assert_eq!(buf, data);

    // The read is a single window
    let reads = window_transfers(dev.transport(), opcodes::READ_4B);
    assert_eq!(reads.len(), 1);
    let clocked: usize = reads[0][1..].iter().map(|(_, rx)| rx).sum();
    assert_eq!(clocked, 1000);
}

#[test]
fn test_write_starting_mid_page_wraps() {
    let mut flash = DummyFlash::new_default();
    let data = pattern(256);

    protocol::program(&mut flash, 0x80, &data, PAGE_SIZE, BusyPolicy::default()).unwrap();

    assert_eq!(flash.count_command(opcodes::PP_4B), 1);
    assert_eq!(&flash.data()[0x80..0x100], &data[..128]);
    assert_eq!(&flash.data()[..0x80], &data[128..]);
    assert!(flash.data()[0x100..0x200].iter().all(|&b| b == 0xFF));
}

#[test]
fn test_busy_hook_called_per_busy_poll() {
    let config = DummyConfig {
        busy_polls: 3,
        ..Default::default()
    };
    let mut flash = DummyFlash::new(config);

    protocol::erase_sector(&mut flash, 0, BusyPolicy::default()).unwrap();

    assert_eq!(flash.busy_hook_calls(), 3);
    assert_eq!(flash.count_command(opcodes::RDSR1), 4);
}

#[test]
fn test_write_protected_sends_no_program() {
    let config = DummyConfig {
        write_protect: true,
        ..Default::default()
    };
    let mut flash = DummyFlash::new(config);
    let mut dev = S25fl064l::new(&mut flash);
    dev.initialize().unwrap();

    let result = dev.write(0, &[0x00; 32]);

    assert_eq!(result, Err(Error::WriteProtected));
    assert!(dev.is_write_protected());
    let flash = dev.transport();
    assert_eq!(flash.count_command(opcodes::PP_4B), 0);
    assert!(flash.data()[..32].iter().all(|&b| b == 0xFF));
    assert!(flash.cs_balanced());
}

#[test]
fn test_write_protected_flag_clears_on_success() {
    let config = DummyConfig {
        write_protect: true,
        ..Default::default()
    };
    let mut flash = DummyFlash::new(config);
    let mut dev = S25fl064l::new(&mut flash);
    dev.initialize().unwrap();

    assert!(dev.write(0, &[0x00]).is_err());
    dev.transport_mut().config_mut().write_protect = false;
    dev.write(0, &[0x00]).unwrap();

    assert!(!dev.is_write_protected());
}

#[test]
fn test_chip_select_released_on_transport_failure() {
    let data = pattern(600);
    for fail_at in 0..40 {
        let config = DummyConfig {
            fail_transfer_at: Some(fail_at),
            ..Default::default()
        };
        let mut flash = DummyFlash::new(config);

        let result = protocol::program(&mut flash, 0, &data, PAGE_SIZE, BusyPolicy::default());
        if let Err(err) = result {
            assert_eq!(err, Error::Transport(DummyError::Injected));
        }
        assert!(flash.cs_balanced(), "program, failing transfer {}", fail_at);
        assert!(!flash.is_selected());

        let mut buf = [0u8; 600];
        let _ = protocol::read(&mut flash, 0, &mut buf);
        assert!(flash.cs_balanced(), "read, failing transfer {}", fail_at);
    }
}

#[test]
fn test_initialize_propagates_transport_failure() {
    for fail_at in 0..8 {
        let config = DummyConfig {
            fail_transfer_at: Some(fail_at),
            ..Default::default()
        };
        let mut flash = DummyFlash::new(config);
        let mut dev = S25fl064l::new(&mut flash);

        let result = dev.initialize();

        assert_eq!(result, Err(Error::Transport(DummyError::Injected)));
        assert!(!dev.is_initialized());
        assert!(dev.transport().cs_balanced());
    }
}

#[test]
fn test_bounded_busy_wait_times_out() {
    let config = DummyConfig {
        stuck_busy: true,
        ..Default::default()
    };
    let mut flash = DummyFlash::new(config);
    let mut dev = S25fl064l::with_config(
        &mut flash,
        Config {
            busy: BusyPolicy::bounded(5),
        },
    );
    dev.initialize().unwrap();

    let result = dev.erase_sector(0);

    assert_eq!(result, Err(Error::Timeout));
    assert!(result.unwrap_err().is_timeout());
    assert_eq!(dev.transport().busy_hook_calls(), 5);
    assert!(dev.transport().cs_balanced());
}

#[test]
fn test_error_status_reads_then_clears() {
    let config = DummyConfig {
        program_error: true,
        ..Default::default()
    };
    let mut flash = DummyFlash::new(config);
    let mut dev = S25fl064l::new(&mut flash);
    dev.initialize().unwrap();

    assert_eq!(dev.error_status().unwrap(), ErrorStatus::empty());
    dev.write(0, &[0x55]).unwrap();
    assert!(dev.transport().status2().contains(Status2::P_ERR));

    assert_eq!(dev.error_status().unwrap(), ErrorStatus::PROGRAM);
    assert!(dev.transport().status2().is_empty());
    assert_eq!(dev.error_status().unwrap(), ErrorStatus::empty());
    assert_eq!(dev.transport().count_command(opcodes::CLSR), 3);
}

#[test]
fn test_erase_error_status() {
    let config = DummyConfig {
        erase_error: true,
        ..Default::default()
    };
    let mut flash = DummyFlash::new(config);

    protocol::erase_chip(&mut flash, BusyPolicy::default()).unwrap();

    let status = protocol::read_error_status(&mut flash).unwrap();
    assert_eq!(status, ErrorStatus::ERASE);
}

#[test]
fn test_invalid_parameters() {
    let mut flash = DummyFlash::new_default();

    assert_eq!(
        protocol::command(&mut flash, &[], &mut []),
        Err(Error::InvalidParameter)
    );
    assert_eq!(
        protocol::command(&mut flash, &[0; 6], &mut []),
        Err(Error::InvalidParameter)
    );
    assert_eq!(
        protocol::program(&mut flash, 0, &[0x00], 0, BusyPolicy::default()),
        Err(Error::InvalidParameter)
    );
    let mut buf = [0u8; 2];
    assert_eq!(
        protocol::read(&mut flash, u32::MAX, &mut buf),
        Err(Error::InvalidParameter)
    );
    assert!(flash.events().is_empty());
}

#[test]
fn test_empty_buffers_are_noops() {
    let mut flash = DummyFlash::new_default();

    protocol::program(&mut flash, 0, &[], PAGE_SIZE, BusyPolicy::default()).unwrap();
    protocol::read(&mut flash, 0, &mut []).unwrap();

    assert!(flash.events().is_empty());
}

#[test]
fn test_block_device_requires_initialization() {
    let mut flash = DummyFlash::new_default();
    let mut dev = S25fl064l::new(&mut flash);
    let mut block = BlockDevice::new(&mut dev);

    let mut buf = [0u8; 4];
    assert_eq!(block.read(0, 0, &mut buf), Err(Error::NotInitialized));
    assert_eq!(block.prog(0, 0, &buf), Err(Error::NotInitialized));
    assert_eq!(block.erase(0), Err(Error::NotInitialized));
    assert_eq!(block.sync(), Err(Error::NotInitialized));
}

#[test]
fn test_block_device_round_trip() {
    let mut flash = DummyFlash::new_default();
    let mut dev = S25fl064l::new(&mut flash);
    dev.initialize().unwrap();
    let mut block = BlockDevice::new(&mut dev);

    assert_eq!(block.block_size(), 4096);
    assert_eq!(block.block_count(), 2048);

    let data = pattern(512);
    block.erase(3).unwrap();
    block.prog(3, 256, &data).unwrap();
    block.sync().unwrap();

    let mut buf = vec![0u8; 512];
    block.read(3, 256, &mut buf).unwrap();
    assert_eq!(buf, data);
    drop(block);

    assert_eq!(&dev.transport().data()[3 * 4096 + 256..3 * 4096 + 768], &data[..]);
}

#[test]
fn test_block_device_bounds() {
    let mut flash = DummyFlash::new_default();
    let mut dev = S25fl064l::new(&mut flash);
    dev.initialize().unwrap();
    let mut block = BlockDevice::new(&mut dev);

    let mut buf = [0u8; 16];
    assert_eq!(block.erase(2048), Err(Error::AddressOutOfBounds));
    assert_eq!(block.read(0, 4090, &mut buf), Err(Error::AddressOutOfBounds));
    assert_eq!(block.prog(2047, 4096, &buf[..1]), Err(Error::AddressOutOfBounds));
    block.read(2047, 4080, &mut buf).unwrap();
}

#[test]
fn test_memtest_passes_on_healthy_flash() {
    let mut flash = DummyFlash::new_default();
    let mut dev = S25fl064l::new(&mut flash);
    dev.initialize().unwrap();

    let mut passed = Vec::new();
    let fault = raw_memtest(&mut dev, 4..6, |sector| passed.push(sector)).unwrap();

    assert_eq!(fault, None);
    assert_eq!(passed, vec![4, 5]);
    assert_eq!(dev.transport().count_command(opcodes::SE_4B), 2);
    assert_eq!(dev.transport().count_command(opcodes::PP_4B), 32);
}

#[test]
fn test_memtest_reports_first_fault() {
    // Bit 0 of byte 10 in page 1 of sector 4 never reads back as one
    let address = 4 * BLOCK_SIZE as usize + PAGE_SIZE + 10;
    let config = DummyConfig {
        stuck_low: Some((address, 0x01)),
        ..Default::default()
    };
    let mut flash = DummyFlash::new(config);
    let mut dev = S25fl064l::new(&mut flash);
    dev.initialize().unwrap();

    let mut passed = Vec::new();
    let fault = raw_memtest(&mut dev, 3..6, |sector| passed.push(sector))
        .unwrap()
        .expect("stuck bit not detected");

    assert_eq!(
        fault,
        Fault {
            sector: 4,
            page: 1,
            byte: 10,
            expected: 0x0F,
            found: 0x0E,
        }
    );
    assert_eq!(fault.address(BLOCK_SIZE) as usize, address);

    // Sector 3 passed, the test stopped inside sector 4
    assert_eq!(passed, vec![3]);
    assert_eq!(dev.transport().count_command(opcodes::SE_4B), 2);
    assert_eq!(dev.transport().count_command(opcodes::PP_4B), 16 + 2);
}

#[test]
fn test_memtest_rejects_bad_range() {
    let mut flash = DummyFlash::new_default();
    let mut dev = S25fl064l::new(&mut flash);

    assert_eq!(
        raw_memtest(&mut dev, 0..1, |_| {}),
        Err(Error::NotInitialized)
    );

    dev.initialize().unwrap();
    assert_eq!(
        raw_memtest(&mut dev, 2047..2049, |_| {}),
        Err(Error::AddressOutOfBounds)
    );
}

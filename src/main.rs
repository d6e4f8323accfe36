//! SdLogger Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  StorageLogSink   MountTable   SystemClock   SntpTimeSource    │
//! │  (RecordSink)     (VolumePort) (Clock)       (TimeSource)      │
//! │  NetifAdapter     AdcChannel×2 EdgeInputPin  LivenessPin       │
//! │  (NetworkPort)    (AnalogInput)(EdgeInput)   (OutputPin)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Boot ──▶ Scheduler (liveness · light · temp · edge)   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::fs::fatfs::Fatfs;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::sd::spi::SdSpiHostDriver;
use esp_idf_svc::hal::sd::{SdCardConfiguration, SdCardDriver};
use esp_idf_svc::hal::spi::config::DriverConfig;
use esp_idf_svc::hal::spi::{Dma, SPI3, SpiDriver};
use esp_idf_svc::io::vfs::MountedFatfs;

use sdlogger::adapters::log_sink::StorageLogSink;
use sdlogger::adapters::netif::NetifAdapter;
use sdlogger::adapters::sntp::SntpTimeSource;
use sdlogger::adapters::time::SystemClock;
use sdlogger::adapters::volume::{MountSlot, MountTable};
use sdlogger::app::boot::{self, Boot, NodeIo};
use sdlogger::app::edge::EdgeLatch;
use sdlogger::app::ports::{Clock, RecordSink};
use sdlogger::config::NodeConfig;
use sdlogger::drivers::edge_input::EdgeInputPin;
use sdlogger::drivers::hw_init;
use sdlogger::drivers::liveness_pin::LivenessPin;
use sdlogger::pins;
use sdlogger::sensors::AdcChannel;

/// Interrupt → edge handler hand-off.
static EDGE_LATCH: EdgeLatch = EdgeLatch::new();

const MAX_OPEN_FILES: usize = 4;

type SdMount = MountedFatfs<Fatfs<SdCardDriver<SdSpiHostDriver<'static, SpiDriver<'static>>>>>;

/// Mount the SD card's FAT volume over SPI at `mount_point`.
fn mount_sd(spi: SPI3, mount_point: &str) -> Result<SdMount> {
    // SAFETY: these GPIOs are reserved for the card and claimed nowhere else.
    let (sclk, mosi, miso, cs) = unsafe {
        (
            AnyIOPin::new(pins::SD_SCLK_GPIO),
            AnyIOPin::new(pins::SD_MOSI_GPIO),
            AnyIOPin::new(pins::SD_MISO_GPIO),
            AnyIOPin::new(pins::SD_CS_GPIO),
        )
    };

    let spi = SpiDriver::new(spi, sclk, mosi, Some(miso), &DriverConfig::default().dma(Dma::Auto(4096)))?;
    let host = SdSpiHostDriver::new(spi, Some(cs), AnyIOPin::none(), AnyIOPin::none(), AnyIOPin::none(), None)?;
    let card = SdCardDriver::new_spi(host, &SdCardConfiguration::new())?;
    let fatfs = Fatfs::new_sdcard(0, card)?;
    Ok(MountedFatfs::mount(fatfs, mount_point, MAX_OPEN_FILES)?)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SdLogger v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = NodeConfig::default();
    let peripherals = Peripherals::take()?;
    // Brings up the default event loop the netif and Ethernet drivers post to.
    let _sysloop = EspSystemEventLoop::take()?;

    // ── 2. Hardware peripherals ───────────────────────────────
    hw_init::init_peripherals()?;
    let edge = EdgeInputPin::attach(&EDGE_LATCH)?;

    // ── 3. Storage ────────────────────────────────────────────
    // A missing card is not fatal: the sink drops records until one is
    // mounted, and the slot keeps retrying from the parked main thread.
    let mut spi3 = peripherals.spi3;
    let mount_point = config.mount_point.clone();
    let mut card = MountSlot::new(&config.mount_point, move || {
        // SAFETY: SPI3 is only ever driven by the card mount, and a failed
        // attempt has dropped its driver before the next one starts.
        let spi = unsafe { spi3.clone_unchecked() };
        mount_sd(spi, &mount_point)
    });
    if !card.poll() {
        warn!(
            "SD: not mounted, retrying every {} s",
            config.card_retry_period().as_secs()
        );
    }
    let volumes = MountTable::new().with_mount(&config.volume_name, &config.mount_point);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let sink: Arc<dyn RecordSink> = Arc::new(StorageLogSink::new(volumes, &config));

    // ── 4. Boot sequence ──────────────────────────────────────
    // The Ethernet MAC/PHY driver registers ETH_DEF with the netif layer;
    // the adapter only drives DHCP on whatever interfaces exist.
    let mut network = NetifAdapter::new();
    let mut time_source = SntpTimeSource::from_config(&config);
    let io = NodeIo {
        light: AdcChannel::new(hw_init::ADC1_CH_LIGHT),
        temperature: AdcChannel::new(hw_init::ADC1_CH_TEMP),
        edge,
        edge_latch: &EDGE_LATCH,
        liveness: LivenessPin::new(pins::LIVENESS_GPIO),
    };

    let sched = match Boot::new(&config, clock, sink).run(&mut network, &mut time_source, io) {
        Ok(s) => s,
        Err(e) => {
            error!("BOOT | failed: {}", e);
            return Err(e.into());
        }
    };

    // ── 5. Steady state ───────────────────────────────────────
    let _sched = sched.spawn()?;
    boot::park_forever(config.card_retry_period(), move || {
        card.poll();
    })
}

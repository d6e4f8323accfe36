//! Samplers on the simulated ADC writing through the storage sink.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use sdlogger::adapters::log_sink::StorageLogSink;
use sdlogger::adapters::volume::MountTable;
use sdlogger::app::ports::{AnalogInput, Clock, RecordSink};
use sdlogger::app::sampler::{PeriodicSampler, SamplerSpec};
use sdlogger::config::NodeConfig;
use sdlogger::drivers::hw_init::{ADC1_CH_LIGHT, ADC1_CH_TEMP};
use sdlogger::sensors::{AdcChannel, sim_set_adc};

use crate::mock_hw::*;

#[test]
fn simulated_adc_readings_reach_their_files() {
    let dir = scratch_dir("sampler");
    let sink: Arc<dyn RecordSink> = Arc::new(StorageLogSink::new(
        MountTable::new().with_mount("SD", &dir),
        &NodeConfig::default(),
    ));
    let clock: Arc<dyn Clock> = Arc::new(MockClock::unsynced());
    clock.set(SYNCED_AT).unwrap();

    // 12-bit counts that normalise to 200 and 500 on [0, 1024).
    sim_set_adc(ADC1_CH_LIGHT, 800);
    sim_set_adc(ADC1_CH_TEMP, 2000);

    let mut light_in = AdcChannel::new(ADC1_CH_LIGHT);
    let mut temp_in = AdcChannel::new(ADC1_CH_TEMP);
    light_in.set_range(0, 1024);
    temp_in.set_range(0, 1024);

    let mut light = PeriodicSampler::new(
        SamplerSpec::light(Duration::from_secs(60)),
        light_in,
        clock.clone(),
        sink.clone(),
    );
    let mut temp = PeriodicSampler::new(
        SamplerSpec::temperature(Duration::from_secs(60)),
        temp_in,
        clock.clone(),
        sink.clone(),
    );

    assert_eq!(light.fire().raw, 200);
    assert_eq!(temp.fire().value(), 120.8984375);

    assert_eq!(
        fs::read_to_string(dir.join("light.log")).unwrap(),
        "2026-10-16 08:30:00: Light level 200\n"
    );
    assert_eq!(
        fs::read_to_string(dir.join("temp.log")).unwrap(),
        "2026-10-16 08:30:00: Temperature: 120.8984375\n"
    );
}

#[test]
fn sampling_continues_without_a_card() {
    let dir = scratch_dir("nocard");
    let sink: Arc<dyn RecordSink> = Arc::new(StorageLogSink::new(
        MountTable::new().with_mount("SD", dir.join("absent")),
        &NodeConfig::default(),
    ));
    let clock: Arc<dyn Clock> = Arc::new(MockClock::unsynced());
    let input = MockAnalog::reading(7);
    let reads = input.reads.clone();

    let mut light = PeriodicSampler::new(SamplerSpec::light(Duration::from_secs(60)), input, clock, sink);
    for _ in 0..5 {
        assert_eq!(light.fire().raw, 7);
    }
    assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 5);
}

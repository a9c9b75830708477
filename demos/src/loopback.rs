//! Host-runnable walkthrough of the pipeline with the loopback codec.
//!
//! Simulates one transmit over followed by one receive over on a single
//! thread: the "front end" here is just a loop that queues and drains
//! blocks where the interrupt handlers would on hardware.

use dv_pipeline::codec::{LoopbackCodec, VoiceCodec};
use dv_pipeline::constants::BLOCK_SAMPLES;
use dv_pipeline::pipeline::{
    AudioPool, AudioQueue, DvPipeline, IqPool, IqQueue, PipelineConfig, TrxMode,
};
use dv_pipeline::stats::{ber_per_mille, SnrEstimate};
use dv_pipeline::text::{RxLine, TxMessage};

fn main() {
    let iq_pool = IqPool::new();
    let audio_pool = AudioPool::new();
    let iq_queue = IqQueue::new();
    let audio_queue = AudioQueue::new();

    // The nin pattern drifts around the block size the way a real
    // demodulator's sample-clock tracking does.
    let mut pipeline = DvPipeline::new(
        LoopbackCodec::with_pattern(&[200, 56, 384]),
        PipelineConfig::new(),
        &iq_pool,
        &audio_pool,
        &iq_queue,
        &audio_queue,
    );

    // --- Transmit over: microphone blocks in, modulated IQ frames out ---
    println!("TX over:");
    let mut frames = 0;
    for n in 0..6 {
        let mut mic = audio_pool.claim().expect("audio pool exhausted");
        for (i, s) in mic.iter_mut().enumerate() {
            *s = (n * BLOCK_SAMPLES + i) as i16;
        }
        audio_queue.add(mic).ok().expect("audio queue full");

        pipeline.poll(TrxMode::Tx);

        // The RF front end would stream these to the DAC; here we count
        // and drop them.
        while let Some(iq) = iq_queue.remove() {
            frames += 1;
            drop(iq);
        }
    }
    println!("  {frames} IQ frames modulated");

    // --- Receive over: demodulated IQ in, speaker blocks out ---
    println!("RX over:");
    const TOTAL: usize = 8 * BLOCK_SAMPLES;
    let mut fed = 0usize;
    let mut received = 0usize;
    let mut continuous = true;

    while received < TOTAL {
        while fed < TOTAL && iq_queue.room() > 0 {
            let mut block = iq_pool.claim().expect("iq pool exhausted");
            for (i, iq) in block.iter_mut().enumerate() {
                iq.re = (fed + i) as f32;
            }
            iq_queue.add(block).ok().expect("iq queue full");
            fed += BLOCK_SAMPLES;
        }

        pipeline.poll(TrxMode::Rx);

        while let Some(speaker) = audio_queue.remove() {
            for (i, &s) in speaker.iter().enumerate() {
                if s as usize != received + i {
                    continuous = false;
                }
            }
            received += BLOCK_SAMPLES;
        }

        if fed == TOTAL && iq_queue.is_empty() && audio_queue.is_empty() {
            break; // tail shorter than one nin request stays parked
        }
    }
    println!("  {received}/{TOTAL} samples delivered, continuous: {continuous}");

    // --- Telemetry and text, as the display task would read them ---
    let codec = pipeline.codec();
    println!(
        "  BER: {} per mille over {} bits",
        ber_per_mille(codec.total_bit_errors(), codec.total_bits()),
        codec.total_bits()
    );

    let mut snr = SnrEstimate::new();
    for _ in 0..100 {
        snr.update(8.5);
    }
    println!("  SNR: {} dB", snr.db_rounded());

    let mut beacon = TxMessage::new("CQ CQ DE N0CALL ");
    let mut line: RxLine<32> = RxLine::new();
    for _ in 0..16 {
        line.push(beacon.next_byte());
    }
    println!("  text: {:?}", line.as_str());
}

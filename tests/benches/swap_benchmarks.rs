//! # Fusion Bridge Benchmarks
//!
//! | Area | Operation | Target |
//! |------|-----------|--------|
//! | Address codec | EVM <-> Tron conversion | < 50µs |
//! | Time-lock codec | pack + unpack | < 1µs |
//! | Hashes | hash lock + order hash | < 10µs |
//! | Orchestrator | full simulated swap | < 5ms |

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fb_swap_core::algorithms::{address_codec, timelock_codec};
use fb_swap_core::{
    compute_order_hash, create_hash_lock, AddressFormat, BridgeCollaborators, BridgeConfig,
    BridgeOrchestrator, ManualClock, NetworkId, SecureSecret, SimulatedChain, SwapStatus,
    TimeLockSchedule, TransferRequest,
};
use fb_swap_core::algorithms::OrderParams;
use primitive_types::U256;
use std::sync::Arc;

const USER_EVM: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
const USER_TRON: &str = "TJEh7TX8sNj5uq4hXKyYdTrnGmeeG48top";

fn bench_address_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("address-codec");

    group.bench_function("evm_to_tron", |b| {
        b.iter(|| address_codec::normalize(black_box(USER_EVM), AddressFormat::Tron))
    });
    group.bench_function("tron_to_evm", |b| {
        b.iter(|| address_codec::normalize(black_box(USER_TRON), AddressFormat::Evm))
    });
    group.bench_function("reject_garbage", |b| {
        b.iter(|| address_codec::normalize(black_box("T-not-an-address"), AddressFormat::Evm))
    });

    group.finish();
}

fn bench_timelock_codec(c: &mut Criterion) {
    let schedule = TimeLockSchedule::from_fields([1_700_000_000, 0, 300, 3600, 7200]);

    c.bench_function("timelock_pack_unpack", |b| {
        b.iter(|| {
            let word = timelock_codec::pack(black_box(&schedule))?;
            timelock_codec::unpack(word)
        })
    });
}

fn bench_hashes(c: &mut Criterion) {
    let secret = SecureSecret::generate();
    let hash_lock = create_hash_lock(&secret);
    let token = [0x1cu8; 20];
    let maker = [0x5au8; 20];

    c.bench_function("hash_lock", |b| b.iter(|| create_hash_lock(black_box(&secret))));
    c.bench_function("order_hash", |b| {
        b.iter(|| {
            compute_order_hash(black_box(&OrderParams {
                source_chain_id: 11_155_111,
                destination_chain_id: 2,
                token: &token,
                amount: U256::from(1_000_000u64),
                maker: &maker,
                hash_lock: &hash_lock,
            }))
        })
    });
}

fn bench_full_swap(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let chain = Arc::new(SimulatedChain::new());
    let clock = Arc::new(ManualClock::default());
    let mut config = BridgeConfig::default();
    config.orchestrator.poll_interval_ms = 1;
    let orchestrator = BridgeOrchestrator::new(
        config,
        BridgeCollaborators::from_backend(chain.clone(), clock),
    )
    .expect("default config");
    let request = TransferRequest {
        from_network: NetworkId::Sepolia,
        to_network: NetworkId::Tron,
        token: None,
        amount: U256::from(100u64),
        user_address: USER_EVM.to_string(),
        destination_address: None,
    };

    c.bench_function("simulated_swap_to_completion", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let mut record = orchestrator.initiate(&request).expect("initiate");
                while !record.status().is_terminal() {
                    if record.status() == SwapStatus::WaitingForDestination {
                        chain.place_matching_escrow(&record);
                    }
                    orchestrator.advance(&mut record).await.expect("advance");
                }
                black_box(record.status())
            })
        })
    });
}

criterion_group!(
    benches,
    bench_address_codec,
    bench_timelock_codec,
    bench_hashes,
    bench_full_swap
);
criterion_main!(benches);

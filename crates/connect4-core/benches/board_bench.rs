//! Criterion benchmarks for the board engine.
//!
//! Measures the cost of a single `drop_piece` (including win detection from
//! the placed cell) and of playing a complete drawn game.
//!
//! Run with:
//! ```bash
//! cargo bench --package connect4-core --bench board_bench
//! ```

use connect4_core::{Board, GameSnapshot};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Fills the board without a winner; see `tests/board_rules.rs`.
const DRAW_SEQUENCE: [i64; 42] = [
    0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 2, 3, 2, 3, 2, 3, 3, 2, 3, 2, 3, 2, 4, 5, 4, 5, 4, 5, 5,
    4, 5, 4, 5, 4, 6, 6, 6, 6, 6, 6,
];

fn bench_drop_piece(c: &mut Criterion) {
    // A mid-game position so the win check walks non-trivial runs.
    let mut midgame = Board::new();
    for &col in &DRAW_SEQUENCE[..20] {
        let _ = midgame.drop_piece(col);
    }

    c.bench_function("drop_piece_midgame", |b| {
        b.iter(|| {
            let mut board = midgame.clone();
            black_box(board.drop_piece(black_box(4)))
        })
    });
}

fn bench_full_game(c: &mut Criterion) {
    c.bench_function("play_full_drawn_game", |b| {
        b.iter(|| {
            let mut board = Board::new();
            for &col in &DRAW_SEQUENCE {
                let _ = board.drop_piece(black_box(col));
            }
            black_box(board.result())
        })
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut board = Board::new();
    for &col in &DRAW_SEQUENCE[..30] {
        let _ = board.drop_piece(col);
    }

    c.bench_function("game_snapshot", |b| {
        b.iter(|| black_box(GameSnapshot::from(black_box(&board))))
    });
}

criterion_group!(benches, bench_drop_piece, bench_full_game, bench_snapshot);
criterion_main!(benches);

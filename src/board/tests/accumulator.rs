//! NNUE accumulator maintenance: incremental updates must equal a
//! from-scratch rebuild at every position, including the king-move
//! refresh path.

use rand::prelude::*;

use crate::board::{Board, Color};
use crate::nnue::NnueNetwork;

/// A network with pseudo-random feature weights. The dense layers stay
/// zero; accumulator equality only exercises the feature transformer.
fn random_feature_net(seed: u64) -> NnueNetwork {
    let mut net = NnueNetwork::zeroed_for_tests();
    let mut rng = StdRng::seed_from_u64(seed);
    for b in net.ft_bias.iter_mut() {
        *b = rng.gen_range(-64..=64);
    }
    for column in net.ft_weights.iter_mut() {
        for w in column.iter_mut() {
            *w = rng.gen_range(-32..=32);
        }
    }
    net
}

fn accumulators_match_scratch(board: &Board, net: &NnueNetwork) {
    let mut rebuilt = board.clone();
    rebuilt.refresh_accumulators(net);
    for color in [Color::White, Color::Black] {
        assert_eq!(
            board.accumulators[color.index()].values.as_slice(),
            rebuilt.accumulators[color.index()].values.as_slice(),
            "{color} accumulator diverged from scratch rebuild"
        );
    }
}

#[test]
fn test_incremental_updates_match_scratch_along_random_games() {
    let net = random_feature_net(7);

    for seed in 0..4u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::new();
        board.refresh_accumulators(&net);

        for _ in 0..60 {
            let moves = board.generate_moves();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            let mut next = board.clone();
            assert!(next.make_move(mv, Some(&net)));
            accumulators_match_scratch(&next, &net);
            board = next;
        }
    }
}

#[test]
fn test_king_move_refresh_path() {
    let net = random_feature_net(11);
    let mut board = Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
    board.refresh_accumulators(&net);

    // Castling: a king move plus a rook move in one
    let castle = board.parse_move("e1g1").expect("castling is legal");
    let mut after_castle = board.clone();
    assert!(after_castle.make_move(castle, Some(&net)));
    accumulators_match_scratch(&after_castle, &net);

    // Plain king step
    let step = board.parse_move("e1d1").expect("king step is legal");
    let mut after_step = board.clone();
    assert!(after_step.make_move(step, Some(&net)));
    accumulators_match_scratch(&after_step, &net);
}

#[test]
fn test_en_passant_and_promotion_updates() {
    let net = random_feature_net(13);

    let mut board =
        Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
    board.refresh_accumulators(&net);
    let ep = board.parse_move("e5f6").expect("en passant is legal");
    let mut after = board.clone();
    assert!(after.make_move(ep, Some(&net)));
    accumulators_match_scratch(&after, &net);

    let mut board = Board::from_fen("1n5k/P7/8/8/8/8/8/K7 w - - 0 1");
    board.refresh_accumulators(&net);
    for text in ["a7a8q", "a7b8n"] {
        let mv = board.parse_move(text).expect("promotion is legal");
        let mut after = board.clone();
        assert!(after.make_move(mv, Some(&net)));
        accumulators_match_scratch(&after, &net);
    }
}

#[test]
fn test_capture_updates() {
    let net = random_feature_net(17);
    let mut board = Board::from_fen("4k3/8/8/3r4/8/8/8/3RK3 w - - 0 1");
    board.refresh_accumulators(&net);

    let capture = board.parse_move("d1d5").expect("capture is legal");
    let mut after = board.clone();
    assert!(after.make_move(capture, Some(&net)));
    accumulators_match_scratch(&after, &net);
}

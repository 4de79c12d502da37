//! Cross-cutting board properties: perft, zobrist maintenance, random
//! playout invariants and NNUE accumulator equivalence.

mod accumulator;
mod perft;

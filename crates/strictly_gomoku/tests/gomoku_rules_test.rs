//! Tests for five-in-a-row rules through the public API.

use strictly_gomoku::{
    BOARD_SIZE, Board, BoardError, Coord, GameStatus, GameView, GomokuInvariants, InvariantSet,
    Move, Outcome, Symbol, TurnState, check_win,
};

/// Plays alternating moves from a fresh started game.
fn play(moves: &[(usize, usize)]) -> (Board, TurnState) {
    let mut turn = TurnState::new();
    turn.start().expect("waiting game starts");
    let mut board = Board::new();

    for (i, &(row, col)) in moves.iter().enumerate() {
        let mv = Move::new(Coord::new(row, col), turn.current_turn(), i as u64 + 1);
        board = board.apply(&mv).expect("legal move");
        turn.resolve_move(&board, &mv).expect("game still playing");
    }

    (board, turn)
}

#[test]
fn test_turn_alternation() {
    let (_, turn) = play(&[]);
    assert_eq!(turn.current_turn(), Symbol::X);

    let (_, turn) = play(&[(7, 7)]);
    assert_eq!(turn.current_turn(), Symbol::O);

    let (_, turn) = play(&[(7, 7), (8, 8)]);
    assert_eq!(turn.current_turn(), Symbol::X);
}

#[test]
fn test_x_wins_horizontally() {
    let (board, turn) = play(&[
        (7, 7),
        (0, 0),
        (7, 8),
        (0, 1),
        (7, 10),
        (0, 2),
        (7, 11),
        (0, 3),
        (7, 9), // closes the gap in the middle
    ]);

    assert_eq!(turn.status(), GameStatus::Ended);
    assert_eq!(turn.outcome(), Some(Outcome::Winner(Symbol::X)));

    let expected: Vec<Coord> = (7..=11).map(|c| Coord::new(7, c)).collect();
    assert_eq!(turn.winning_line(), expected.as_slice());
    assert_eq!(
        check_win(&board, Coord::new(7, 9), Symbol::X).map(|l| l.into_cells()),
        Some(expected)
    );
    assert!(GomokuInvariants::check_all(&GameView::new(&board, &turn)).is_ok());
}

#[test]
fn test_move_after_end_keeps_verdict() {
    let (board, mut turn) = play(&[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2), (1, 2), (0, 3), (1, 3), (0, 4)]);
    assert_eq!(turn.status(), GameStatus::Ended);

    let late = Move::new(Coord::new(9, 9), Symbol::O, 10);
    let board = board.apply(&late).expect("cell is empty");
    // Board accepts the stone, the arbiter keeps the verdict
    turn.resolve_move(&board, &late).expect("ended games accept recorded moves");
    assert_eq!(turn.outcome(), Some(Outcome::Winner(Symbol::X)));
}

#[test]
fn test_board_rejects_out_of_range() {
    let board = Board::new();
    let err = board
        .apply(&Move::new(Coord::new(BOARD_SIZE, 3), Symbol::X, 1))
        .expect_err("off the board");
    assert_eq!(err, BoardError::OutOfBounds(Coord::new(BOARD_SIZE, 3)));
    assert!(err.to_string().contains("off the board"));
}

#[test]
fn test_board_serializes_as_value() {
    let (board, _) = play(&[(3, 3), (4, 4)]);
    let json = serde_json::to_string(&board).expect("serializable");
    let back: Board = serde_json::from_str(&json).expect("deserializable");
    assert_eq!(back, board);
}

use crate::error::{ProtocolError, SessionError, StateError};
use crate::message::ServerMessage;
use crate::state::{GameState, PlayerAction, Seat};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 会话在整个生命周期中的概念状态，由当前快照推导
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoSnapshot,
    Lobby,
    InHand,
    MyTurn,
    Showdown,
    Ended,
}

/// 应用完一个事件后发给界面层的通知
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SnapshotReplaced(Arc<GameState>),
    TurnGranted(Arc<GameState>),
    /// 一手牌的结果，随 is_showdown 的快照一起到达
    RoundResult { winner: Option<Seat> },
    SessionEnded { winner: Option<Seat> },
    Error { message: String },
}

/// 界面层协作者。核心只通过它通知界面，不直接渲染任何东西。
pub trait Presenter {
    fn on_snapshot_replaced(&mut self, snapshot: &GameState);
    fn on_turn_granted(&mut self, snapshot: &GameState);
    fn on_round_result(&mut self, winner: Option<Seat>);
    fn on_session_ended(&mut self, winner: Option<Seat>);
    fn on_protocol_error(&mut self, message: &str);
}

impl SessionEvent {
    pub fn deliver<P: Presenter + ?Sized>(&self, presenter: &mut P) {
        match self {
            SessionEvent::SnapshotReplaced(state) => presenter.on_snapshot_replaced(state),
            SessionEvent::TurnGranted(state) => presenter.on_turn_granted(state),
            SessionEvent::RoundResult { winner } => presenter.on_round_result(*winner),
            SessionEvent::SessionEnded { winner } => presenter.on_session_ended(*winner),
            SessionEvent::Error { message } => presenter.on_protocol_error(message),
        }
    }
}

/// 持有当前快照的唯一所有者。
///
/// - `snapshot` 一次性整体替换，读者只会看到完整的快照；
/// - `ended` 的锁在整个 apply 期间被持有，保证事件严格按到达顺序串行应用；
/// - 通知通过无界通道发出，不会阻塞接收方。
pub struct Session {
    snapshot: RwLock<Option<Arc<GameState>>>,
    ended: Mutex<bool>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Session {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session {
            snapshot: RwLock::new(None),
            ended: Mutex::new(false),
            events: tx,
        };
        (session, rx)
    }

    /// 当前快照。返回的是共享引用，之后的替换不会影响它
    pub fn snapshot(&self) -> Option<Arc<GameState>> {
        self.snapshot.read().clone()
    }

    pub fn is_ended(&self) -> bool {
        *self.ended.lock()
    }

    pub fn phase(&self) -> SessionPhase {
        // 与 apply 相同的加锁顺序，结束标记和快照来自同一时刻
        let ended = self.ended.lock();
        if *ended {
            return SessionPhase::Ended;
        }
        match self.snapshot.read().as_deref() {
            None => SessionPhase::NoSnapshot,
            Some(state) if !state.is_started => SessionPhase::Lobby,
            Some(state) if state.is_showdown => SessionPhase::Showdown,
            Some(state) if state.my_turn => SessionPhase::MyTurn,
            Some(_) => SessionPhase::InHand,
        }
    }

    pub fn legal_actions(&self) -> Vec<PlayerAction> {
        self.snapshot
            .read()
            .as_deref()
            .map(GameState::legal_actions)
            .unwrap_or_default()
    }

    /// 解码并应用一帧文本。失败会作为错误通知报告给界面层，会话继续。
    pub fn handle_text(&self, text: &str) -> Result<(), SessionError> {
        self.handle(ServerMessage::decode_str(text))
    }

    /// 同 `handle_text`，输入是传输层交付的原始字节
    pub fn handle_frame(&self, frame: &[u8]) -> Result<(), SessionError> {
        self.handle(ServerMessage::decode_slice(frame))
    }

    /// 同 `handle_text`，输入是已经解析好的线上对象
    pub fn handle_wire(&self, value: Value) -> Result<(), SessionError> {
        self.handle(ServerMessage::decode(value))
    }

    fn handle(&self, decoded: Result<ServerMessage, ProtocolError>) -> Result<(), SessionError> {
        let result = decoded
            .map_err(SessionError::from)
            .and_then(|msg| self.apply(msg).map_err(SessionError::from));
        if let Err(e) = &result {
            warn!("丢弃服务器消息: {}", e);
            self.notify(SessionEvent::Error { message: e.to_string() });
        }
        result
    }

    /// 应用一个已解码的事件
    pub fn apply(&self, msg: ServerMessage) -> Result<(), StateError> {
        let mut ended = self.ended.lock();
        if *ended {
            return Err(StateError::SessionEnded(msg.type_tag()));
        }

        match msg {
            ServerMessage::GameState(state) => {
                let is_showdown = state.is_showdown;
                let winner = state.hand_winner;
                let installed = self.replace(state);
                self.notify(SessionEvent::SnapshotReplaced(installed));
                // 一手牌的结果没有专门的消息，夹带在快照里
                if is_showdown {
                    self.notify(SessionEvent::RoundResult { winner });
                }
            }
            ServerMessage::AwaitingPlayer => {
                let patched = self.grant_turn()?;
                self.notify(SessionEvent::TurnGranted(patched));
            }
            ServerMessage::GameEnd { winner } => {
                *ended = true;
                info!("游戏结束, 赢家座位: {:?}", winner);
                self.notify(SessionEvent::SessionEnded { winner });
            }
        }
        Ok(())
    }

    /// 整体替换快照。旧快照在写锁释放后才被丢弃
    fn replace(&self, state: GameState) -> Arc<GameState> {
        let round = state.round_number;
        let new = Arc::new(state);
        let old = self.snapshot.write().replace(Arc::clone(&new));
        match old {
            Some(old) => debug!("快照已替换: 第 {} 轮 -> 第 {} 轮", old.round_number, round),
            None => info!("收到第一份快照: 第 {} 轮", round),
        }
        new
    }

    /// 只修改 my_turn。还有读者持有旧快照时会先复制一份，读者看到的内容不变
    fn grant_turn(&self) -> Result<Arc<GameState>, StateError> {
        let mut cell = self.snapshot.write();
        let current = cell
            .as_mut()
            .ok_or(StateError::NoSnapshot("awaiting_player"))?;
        Arc::make_mut(current).my_turn = true;
        debug!("轮到本地玩家行动");
        Ok(Arc::clone(current))
    }

    fn notify(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("界面层已关闭，通知被丢弃");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::state_with_bets;
    use serde_json::json;

    fn snapshot(bets: &[u32], round_number: u32) -> GameState {
        let mut state = state_with_bets(bets, round_number);
        state.my_turn = false;
        state
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_awaiting_player_without_snapshot_is_state_error() {
        let (session, mut rx) = Session::new();
        assert_eq!(
            session.apply(ServerMessage::AwaitingPlayer),
            Err(StateError::NoSnapshot("awaiting_player"))
        );
        assert!(session.snapshot().is_none());
        assert_eq!(session.phase(), SessionPhase::NoSnapshot);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_awaiting_player_only_flips_my_turn() {
        let (session, mut rx) = Session::new();
        session.apply(ServerMessage::GameState(snapshot(&[0, 10], 1))).unwrap();
        let before = session.snapshot().unwrap();

        session.apply(ServerMessage::AwaitingPlayer).unwrap();
        let after = session.snapshot().unwrap();

        assert!(after.my_turn);
        assert!(!before.my_turn, "readers keep their own snapshot");
        let mut expected = (*before).clone();
        expected.my_turn = true;
        assert_eq!(*after, expected);
        assert_eq!(session.phase(), SessionPhase::MyTurn);

        let events = drain(&mut rx);
        assert!(matches!(events.as_slice(), [
            SessionEvent::SnapshotReplaced(_),
            SessionEvent::TurnGranted(granted),
        ] if granted.my_turn));
    }

    #[test]
    fn test_new_snapshot_resets_turn_flag() {
        let (session, _rx) = Session::new();
        session.apply(ServerMessage::GameState(snapshot(&[0, 0], 0))).unwrap();
        session.apply(ServerMessage::AwaitingPlayer).unwrap();
        session.apply(ServerMessage::GameState(snapshot(&[0, 5], 0))).unwrap();
        let current = session.snapshot().unwrap();
        assert!(!current.my_turn);
        assert_eq!(current.highest_bet(), 5);
        assert_eq!(session.phase(), SessionPhase::InHand);
        assert!(session.legal_actions().is_empty());
    }

    #[test]
    fn test_showdown_snapshot_emits_round_result() {
        let (session, mut rx) = Session::new();
        let mut state = snapshot(&[0, 0], 4);
        state.is_showdown = true;
        state.hand_winner = Some(1);
        session.apply(ServerMessage::GameState(state)).unwrap();

        let events = drain(&mut rx);
        assert!(matches!(events.as_slice(), [
            SessionEvent::SnapshotReplaced(_),
            SessionEvent::RoundResult { winner: Some(1) },
        ]));
        assert_eq!(session.phase(), SessionPhase::Showdown);
    }

    #[test]
    fn test_lobby_phase() {
        let (session, _rx) = Session::new();
        let mut state = snapshot(&[0, 0], 0);
        state.is_started = false;
        session.apply(ServerMessage::GameState(state)).unwrap();
        assert_eq!(session.phase(), SessionPhase::Lobby);
    }

    #[test]
    fn test_phase_is_consistent_under_concurrent_apply() {
        let (session, _rx) = Session::new();
        let session = Arc::new(session);
        session.apply(ServerMessage::GameState(snapshot(&[0, 0], 0))).unwrap();

        let writer = {
            let session = Arc::clone(&session);
            std::thread::spawn(move || {
                for round in 1..200 {
                    session.apply(ServerMessage::GameState(snapshot(&[0, 0], round))).unwrap();
                    session.apply(ServerMessage::AwaitingPlayer).unwrap();
                }
                session.apply(ServerMessage::GameEnd { winner: Some(0) }).unwrap();
            })
        };

        let mut seen_end = false;
        while !seen_end {
            let phase = session.phase();
            assert_ne!(phase, SessionPhase::NoSnapshot);
            assert_ne!(phase, SessionPhase::Lobby);
            seen_end = phase == SessionPhase::Ended;
            if seen_end {
                assert!(session.is_ended());
            }
        }
        writer.join().unwrap();
        assert_eq!(session.phase(), SessionPhase::Ended);
    }

    #[test]
    fn test_game_end_is_terminal() {
        let (session, mut rx) = Session::new();
        session.apply(ServerMessage::GameState(snapshot(&[0, 0], 0))).unwrap();
        session.apply(ServerMessage::GameEnd { winner: None }).unwrap();
        assert_eq!(session.phase(), SessionPhase::Ended);

        assert_eq!(
            session.apply(ServerMessage::GameState(snapshot(&[9, 9], 2))),
            Err(StateError::SessionEnded("game_state"))
        );
        assert_eq!(session.snapshot().unwrap().highest_bet(), 0);

        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(SessionEvent::SessionEnded { winner: None })));
    }

    #[test]
    fn test_handle_wire_reports_errors_and_continues() {
        let (session, mut rx) = Session::new();
        let result = session.handle_wire(json!({"type": "game_end"}));
        assert!(matches!(
            result,
            Err(SessionError::Protocol(ProtocolError::MissingField("winner")))
        ));
        assert!(matches!(
            session.handle_wire(json!({"type": "awaiting_player"})),
            Err(SessionError::State(StateError::NoSnapshot(_)))
        ));
        assert!(!session.is_ended());

        assert!(matches!(
            session.handle_text("7:{\"type\""),
            Err(SessionError::Protocol(ProtocolError::Malformed(_)))
        ));

        assert!(matches!(
            session.handle_frame(b"{\"type\":\"game_end\",\"winner\":null,\"x\":\"\xFF\"}"),
            Err(SessionError::Protocol(ProtocolError::Malformed(_)))
        ));
        assert!(!session.is_ended());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| matches!(e, SessionEvent::Error { .. })));
    }

    #[test]
    fn test_end_to_end_two_seat_snapshot() {
        let (session, _rx) = Session::new();
        session
            .handle_wire(json!({
                "type": "game_state",
                "personal_cards": [14, 27],
                "personal_id": 0,
                "middle_cards": [],
                "player_names": ["A", "B"],
                "player_cards": [null, [3, 4]],
                "player_betting_amount": [0, 0],
                "player_money": [100, 100],
                "player_has_folded": [false, false],
                "player_is_out": [false, false],
                "round_number": 0,
                "is_started": true,
                "is_showdown": false,
                "hand_winner": -1
            }))
            .unwrap();
        assert!(session.legal_actions().is_empty());

        session.handle_wire(json!({"type": "awaiting_player"})).unwrap();
        assert_eq!(
            session.legal_actions(),
            vec![PlayerAction::Fold, PlayerAction::Check, PlayerAction::Raise]
        );
        let state = session.snapshot().unwrap();
        assert_eq!(state.players[1].hand.len(), 2);
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Presenter for Recorder {
        fn on_snapshot_replaced(&mut self, snapshot: &GameState) {
            self.calls.push(format!("snapshot:{}", snapshot.round_number));
        }
        fn on_turn_granted(&mut self, _snapshot: &GameState) {
            self.calls.push("turn".to_string());
        }
        fn on_round_result(&mut self, winner: Option<Seat>) {
            self.calls.push(format!("round:{winner:?}"));
        }
        fn on_session_ended(&mut self, winner: Option<Seat>) {
            self.calls.push(format!("end:{winner:?}"));
        }
        fn on_protocol_error(&mut self, _message: &str) {
            self.calls.push("error".to_string());
        }
    }

    #[tokio::test]
    async fn test_events_reach_presenter_in_order() {
        let (session, mut rx) = Session::new();
        let session = Arc::new(session);

        let receiver = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session.handle_wire(json!({"type": "awaiting_player"})).ok();
                session.apply(ServerMessage::GameState(snapshot(&[0, 0], 6))).unwrap();
                session.apply(ServerMessage::AwaitingPlayer).unwrap();
                session.apply(ServerMessage::GameEnd { winner: Some(0) }).unwrap();
            })
        };
        receiver.await.unwrap();
        drop(session);

        let mut recorder = Recorder::default();
        while let Some(event) = rx.recv().await {
            event.deliver(&mut recorder);
        }
        assert_eq!(recorder.calls, vec!["error", "snapshot:6", "turn", "end:Some(0)"]);
    }
}

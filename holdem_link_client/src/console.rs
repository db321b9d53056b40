use holdem_link_core::{Card, Commands, GameState, Presenter, Seat, SessionError};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// 把会话通知打印到终端的界面层
#[derive(Default)]
pub struct ConsolePresenter {
    // 最近一次快照里的玩家名字，用来显示赢家
    names: Vec<String>,
}

impl ConsolePresenter {
    fn winner_name(&self, winner: Option<Seat>) -> String {
        match winner.and_then(|seat| self.names.get(seat)) {
            Some(name) => name.clone(),
            None => "没有人 :(".to_string(),
        }
    }
}

fn format_cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "-".to_string();
    }
    cards.iter().map(Card::to_string).collect::<Vec<_>>().join(" ")
}

/// 渲染一份快照。其他玩家的底牌只在摊牌时显示
pub fn render(state: &GameState) -> String {
    let mut out = String::new();
    if !state.is_started {
        out.push_str("等待游戏开始，输入 ready 准备\n");
    }
    out.push_str(&format!(
        "第 {} 轮 | 公共牌: {}\n",
        state.round_number,
        format_cards(&state.middle_cards)
    ));
    for (seat, player) in state.players.iter().enumerate() {
        let is_me = seat == state.personal_id;
        let cards = if is_me || (state.is_showdown && player.hand.len() == 2) {
            format_cards(&player.hand)
        } else {
            "?? ??".to_string()
        };
        let status = if player.is_out {
            "已出局"
        } else if player.has_folded {
            "已弃牌"
        } else {
            ""
        };
        out.push_str(&format!(
            "{} {:<12} 筹码 {:>6} 下注 {:>6} 手牌 {} {}\n",
            if is_me { "*" } else { " " },
            player.name,
            player.balance,
            player.current_bet,
            cards,
            status
        ));
    }
    if state.is_showdown {
        let winner = state.hand_winner_player().map_or("没有人 :(", |p| p.name.as_str());
        out.push_str(&format!("摊牌! 本手赢家: {}\n", winner));
    } else if state.is_started && !state.my_turn {
        out.push_str("等待轮到你...\n");
    }
    out
}

impl Presenter for ConsolePresenter {
    fn on_snapshot_replaced(&mut self, snapshot: &GameState) {
        self.names = snapshot.players.iter().map(|p| p.name.clone()).collect();
        print!("\n{}", render(snapshot));
        prompt();
    }

    fn on_turn_granted(&mut self, snapshot: &GameState) {
        let actions: Vec<String> = snapshot.legal_actions().iter().map(|a| a.to_string()).collect();
        println!("\n轮到你了! 可用动作: {}", actions.join(", "));
        if snapshot.amount_to_call() > 0 {
            println!("跟注需要补 {}", snapshot.amount_to_call());
        }
        prompt();
    }

    fn on_round_result(&mut self, winner: Option<Seat>) {
        println!("\n本手结束，赢家: {}", self.winner_name(winner));
        prompt();
    }

    fn on_session_ended(&mut self, winner: Option<Seat>) {
        println!("\n游戏结束! 赢家: {}", self.winner_name(winner));
        println!("输入 exit 退出");
        prompt();
    }

    fn on_protocol_error(&mut self, message: &str) {
        eprintln!("\n服务器消息有误: {}", message);
        prompt();
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// 终端里的一条命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Ready,
    Fold,
    Check,
    Call,
    Bet(u32),
    Raise(u32),
    Help,
    Exit,
}

/// 本地输入校验在这里完成，非法金额不会到达编码器
pub fn parse_input(line: &str) -> Result<Input, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let amount = |usage: &str| -> Result<u32, String> {
        match parts.get(1) {
            None => Err(format!("用法: {usage} <金额>")),
            Some(raw) => raw.parse::<u32>().map_err(|_| format!("无效的金额: {raw}")),
        }
    };

    match parts.first().copied() {
        Some("ready") | Some("start") => Ok(Input::Ready),
        Some("fold") => Ok(Input::Fold),
        Some("check") => Ok(Input::Check),
        Some("call") => Ok(Input::Call),
        Some("bet") => amount("bet").map(Input::Bet),
        Some("raise") => amount("raise").map(Input::Raise),
        Some("help") => Ok(Input::Help),
        Some("exit") | Some("quit") => Ok(Input::Exit),
        Some(other) => Err(format!("未知命令: {other}")),
        None => Err("请输入命令，help 查看帮助".to_string()),
    }
}

fn print_help() {
    println!("可用命令:");
    println!("  ready                     - 准备开始游戏");
    println!("  fold                      - 弃牌");
    println!("  check                     - 过牌");
    println!("  call                      - 跟注");
    println!("  bet <金额>                - 下注到指定总额 (0 取消)");
    println!("  raise <金额>              - 加注到指定总额 (0 取消)");
    println!("  exit                      - 退出");
}

fn dispatch(commands: &Commands, input: Input) -> Result<(), SessionError> {
    match input {
        Input::Ready => commands.ready().map(drop),
        Input::Fold => commands.fold().map(drop),
        Input::Check => commands.check().map(drop),
        Input::Call => commands.call().map(drop),
        Input::Bet(amount) => commands.bet(amount).map(drop),
        Input::Raise(amount) => commands.raise(amount).map(drop),
        Input::Help => {
            print_help();
            Ok(())
        }
        Input::Exit => commands.leave().map(drop),
    }
}

/// 读取标准输入并转换为动作，直到用户退出或输入结束
pub async fn read_input(commands: Commands) {
    print_help();
    prompt();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let input = match lines.next_line().await {
            Ok(Some(line)) => match parse_input(&line) {
                Ok(input) => input,
                Err(message) => {
                    println!("{message}");
                    prompt();
                    continue;
                }
            },
            Ok(None) => Input::Exit,
            Err(e) => {
                warn!("读取输入失败: {}", e);
                Input::Exit
            }
        };
        let exit = input == Input::Exit;
        if let Err(e) = dispatch(&commands, input) {
            println!("操作失败: {e}");
        }
        if exit {
            println!("正在断开连接...");
            return;
        }
        prompt();
    }
}

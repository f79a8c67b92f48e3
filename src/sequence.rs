/// 航点番号と動作グループIDの採番状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sequence {
    pub waypoint_index: usize,
    pub action_group_id: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionGroupSlot {
    pub id: usize,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaypointSlot {
    pub index: usize,
    pub action_group: Option<ActionGroupSlot>,
}

impl Sequence {
    /// 1航点分の番号を割り当て、次の状態を返す。
    /// 動作グループIDは動作を持つ航点でのみ進む。
    pub fn advance(self, has_actions: bool) -> (WaypointSlot, Sequence) {
        let action_group = has_actions.then(|| {
            // 開始・終了航点は航点番号ではなくグループIDから求める
            let index = self.action_group_id + 1;
            ActionGroupSlot {
                id: self.action_group_id,
                start_index: index,
                end_index: index,
            }
        });

        let next = Sequence {
            waypoint_index: self.waypoint_index + 1,
            action_group_id: self.action_group_id + usize::from(has_actions),
        };

        (
            WaypointSlot {
                index: self.waypoint_index,
                action_group,
            },
            next,
        )
    }
}

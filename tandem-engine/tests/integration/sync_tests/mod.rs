pub mod test_channel_close_degrades_pair;
pub mod test_time_follows_selection;
pub mod test_user_commands_reach_selected_pair;

mod test_stray_call_accept_is_ignored;
